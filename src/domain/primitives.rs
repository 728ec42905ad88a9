//! Domain primitives: entity identifiers and millisecond timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map($name)
            }
        }
    };
}

entity_id!(
    /// Player account identifier.
    PlayerId
);
entity_id!(
    /// Weekly round identifier.
    RoundId
);
entity_id!(
    /// Board (ticket) identifier.
    BoardId
);
entity_id!(
    /// Deposit identifier.
    DepositId
);

/// Convert a stored millisecond timestamp back into a UTC instant.
///
/// Out-of-range values collapse to the Unix epoch rather than failing the read.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}
