//! Whitespace and placeholder cleanup for scraped text fields.

/// Values upstream pages (or older scrapers) use in place of a missing field.
///
/// A field holding one of these is treated as absent, never stored.
pub const PLACEHOLDERS: &[&str] = &[
    "(없음)",
    "(제목 없음)",
    "제목 없음",
    "(소관위 없음)",
    "소관위 없음",
    "(제안자 없음)",
    "(내용 없음)",
    "내용 없음",
    "링크 없음",
    "-",
];

/// Collapse runs of whitespace into single spaces and trim both ends.
///
/// Non-breaking spaces count as whitespace; zero-width characters and the
/// byte-order mark are dropped.
pub fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars() {
        match ch {
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => {}
            c if c.is_whitespace() || c == '\u{00A0}' => pending_space = true,
            c => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }

    out
}

/// Clean `raw` and return `None` when nothing meaningful is left.
pub fn clean_optional(raw: Option<&str>) -> Option<String> {
    let cleaned = clean(raw?);
    if cleaned.is_empty() || PLACEHOLDERS.contains(&cleaned.as_str()) {
        None
    } else {
        Some(cleaned)
    }
}

/// Canonical form used when deriving identities: cleaned and lowercased.
pub fn identity_form(raw: &str) -> String {
    clean(raw).to_lowercase()
}
