use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Newtype for request and entity GUIDs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(pub String);

impl Guid {
    /// Generate a fresh random GUID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Guid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Guid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Guid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Storage discriminator of a request kind.
///
/// Used both as the storage key of a request list and as the `key` field of
/// the disabled-request envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Filters,
    Charts,
    Ranges,
    Disabled,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Filters => "filters",
            Key::Charts => "charts",
            Key::Ranges => "ranges",
            Key::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown storage key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filters" => Ok(Key::Filters),
            "charts" => Ok(Key::Charts),
            "ranges" => Ok(Key::Ranges),
            "disabled" => Ok(Key::Disabled),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}
