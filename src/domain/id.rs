//! Hash-derived identifiers for catalog records
//!
//! ID Format: `{prefix}-{7-char-hash}`
//! - Tasks: `t-9d3e5f2`
//! - Categories: `c-7f2b4c1`
//! - Tags: `g-1a2b3c4`
//! - Users: `u-0e1d2c3`
//!
//! Hash is derived from a seed (title or e-mail) + creation timestamp, ensuring uniqueness.
//! Same seed at different times produces different IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const HASH_LEN: usize = 7;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid {kind} ID format: expected '{prefix}-{{7-char-hash}}', got '{value}'")]
    InvalidFormat {
        kind: &'static str,
        prefix: &'static str,
        value: String,
    },
}

/// Generates a 7-character hash from a seed and timestamp
fn generate_hash(seed: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", seed, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..HASH_LEN].to_string()
}

fn parse_hash(
    s: &str,
    kind: &'static str,
    prefix: &'static str,
) -> Result<String, IdError> {
    let s = s.trim();
    let invalid = || IdError::InvalidFormat {
        kind,
        prefix,
        value: s.to_string(),
    };

    let hash = s
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(invalid)?;

    if hash.len() != HASH_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    Ok(hash.to_ascii_lowercase())
}

macro_rules! hash_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            hash: String,
        }

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Creates a new ID from a seed and timestamp
            pub fn new(seed: &str, timestamp: DateTime<Utc>) -> Self {
                Self {
                    hash: generate_hash(seed, timestamp),
                }
            }

            /// Returns the hash portion of the ID
            pub fn hash(&self) -> &str {
                &self.hash
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&format!("{}-{}", $prefix, self.hash))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hash(s, $kind, $prefix).map(|hash| Self { hash })
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

hash_id!(
    /// Lendable task ID in the format `t-{7-char-hash}`
    TaskId,
    "t",
    "task"
);

hash_id!(
    /// Category ID in the format `c-{7-char-hash}`
    CategoryId,
    "c",
    "category"
);

hash_id!(
    /// Tag ID in the format `g-{7-char-hash}`
    TagId,
    "g",
    "tag"
);

hash_id!(
    /// Registered user ID in the format `u-{7-char-hash}`
    UserId,
    "u",
    "user"
);
