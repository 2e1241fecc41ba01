use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// A validated object key of the form `{millisecond-timestamp}-{uuid-v4}`.
///
/// Keys are generated server-side and carry no part of the client filename, so
/// they are safe to use as flat file names and URL path segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Generate a fresh key from the current time and a random UUID.
    pub fn generate() -> Self {
        Self(format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4()
        ))
    }

    /// Parse and validate a key string.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let (millis, token) = s
            .split_once('-')
            .ok_or_else(|| StorageError::InvalidKey(format!("missing separator in {s:?}")))?;

        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StorageError::InvalidKey(format!(
                "timestamp part of {s:?} is not a number"
            )));
        }

        let uuid = Uuid::parse_str(token)
            .map_err(|e| StorageError::InvalidKey(format!("token part of {s:?}: {e}")))?;

        // Only the hyphenated lowercase form is produced by `generate`.
        if uuid.hyphenated().to_string() != token {
            return Err(StorageError::InvalidKey(format!(
                "token part of {s:?} is not a hyphenated lowercase UUID"
            )));
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Millisecond timestamp the key was generated at.
    pub fn timestamp_millis(&self) -> i64 {
        self.0
            .split_once('-')
            .and_then(|(millis, _)| millis.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
