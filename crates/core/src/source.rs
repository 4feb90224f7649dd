//! Upstream origin of a legislative notice.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The adapter a notice was collected by. Immutable once an item exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// National Assembly legislative notices (입법부 입법예고).
    National,
    /// Administrative-agency legislative notices (행정부 입법예고).
    Admin,
}

impl Source {
    /// Every known source, in reporting order.
    pub const ALL: [Source; 2] = [Source::National, Source::Admin];

    /// Wire and database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Source::National => "national",
            Source::Admin => "admin",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`Source`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source '{0}'. Must be one of: national, admin")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "national" => Ok(Source::National),
            "admin" => Ok(Source::Admin),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}
