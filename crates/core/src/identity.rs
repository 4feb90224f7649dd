//! Deterministic item identity.
//!
//! Upstream sources have no shared primary key, so the id is derived from
//! the notice itself: the bill number when the source publishes one,
//! otherwise the title and committee. Re-ingesting the same notice always
//! resolves to the same id.
//!
//! ```text
//! key = "bill"  US bill_no                      (bill number present)
//!     | "title" US title US committee           (otherwise)
//! id  = hex(sha256(source US key))[..32]        (US = U+001F)
//! ```
//!
//! All key parts are in [`identity_form`](crate::text::identity_form).

use sha2::{Digest, Sha256};

use crate::source::Source;
use crate::text::identity_form;

/// Length of the hex id kept from the SHA-256 digest (128 bits).
pub const ID_LEN: usize = 32;

const UNIT_SEPARATOR: char = '\u{1F}';

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Derive the stable id of a notice.
///
/// `bill_no` takes precedence when present and non-blank.
pub fn derive_id(source: Source, bill_no: Option<&str>, title: &str, committee: &str) -> String {
    let key = match bill_no.map(identity_form).filter(|b| !b.is_empty()) {
        Some(bill) => format!("bill{UNIT_SEPARATOR}{bill}"),
        None => format!(
            "title{UNIT_SEPARATOR}{}{UNIT_SEPARATOR}{}",
            identity_form(title),
            identity_form(committee)
        ),
    };

    let mut digest = sha256_hex(format!("{}{UNIT_SEPARATOR}{key}", source.as_str()).as_bytes());
    digest.truncate(ID_LEN);
    digest
}
