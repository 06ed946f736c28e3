mod chart;
mod filter;
mod range;

pub use chart::{ChartDefinition, ChartRequest, ChartType, ChartWidths};
pub use filter::{FilterColors, FilterDefinition, FilterFlags, FilterRequest, SearchFilter};
pub use range::{RangeDefinition, RangeRequest};

use thiserror::Error;

use crate::storage::Entry;
use crate::types::{Guid, Key};

/// Reasons a request definition is rejected at construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Filter is empty")]
    EmptyFilter,

    #[error("Invalid regular expression {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Chart filter {0:?} has no capture group")]
    NoCaptureGroup(String),

    #[error("Range needs exactly two filters, got {0}")]
    RangePoints(usize),

    #[error("Range start and end are the same filter")]
    RangeSamePoints,
}

/// Reasons a stored request cannot be restored
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupportable content for disabled request; key = {0}")]
    UnsupportedKey(String),

    #[error("Stored request is invalid: {0}")]
    Invalid(#[from] RequestError),
}

/// Common behaviour of every request kind kept in a store.
///
/// `hash` is the content hash used for deduplication: two requests with equal
/// hashes are the same request regardless of their uuids.
pub trait Request: Clone + Send + Sync + 'static {
    const KEY: Key;

    fn uuid(&self) -> &Guid;

    fn hash(&self) -> String;

    /// Summary lines shown under a provider's title
    fn info(_requests: &[Self]) -> Vec<String> {
        Vec::new()
    }

    fn to_entry(&self) -> serde_json::Result<Entry>;

    fn from_entry(entry: &Entry) -> Result<Self, DecodeError>;

    fn is_same(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

/// Request kinds that stay in a store while switched off
pub trait Activatable: Request {
    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);
}

pub(crate) fn active_info<T: Activatable>(requests: &[T]) -> Vec<String> {
    let active = requests.iter().filter(|r| r.is_active()).count();
    vec![
        format!("{active} active"),
        format!("{} inactive", requests.len() - active),
    ]
}

/// Any request kind that can be disabled
#[derive(Debug, Clone, PartialEq)]
pub enum AnyRequest {
    Filter(FilterRequest),
    Chart(ChartRequest),
    Range(RangeRequest),
}

impl AnyRequest {
    pub fn key(&self) -> Key {
        match self {
            AnyRequest::Filter(_) => FilterRequest::KEY,
            AnyRequest::Chart(_) => ChartRequest::KEY,
            AnyRequest::Range(_) => RangeRequest::KEY,
        }
    }

    pub fn uuid(&self) -> &Guid {
        match self {
            AnyRequest::Filter(r) => r.uuid(),
            AnyRequest::Chart(r) => r.uuid(),
            AnyRequest::Range(r) => r.uuid(),
        }
    }

    pub fn hash(&self) -> String {
        match self {
            AnyRequest::Filter(r) => r.hash(),
            AnyRequest::Chart(r) => r.hash(),
            AnyRequest::Range(r) => r.hash(),
        }
    }

    pub fn to_entry(&self) -> serde_json::Result<Entry> {
        match self {
            AnyRequest::Filter(r) => r.to_entry(),
            AnyRequest::Chart(r) => r.to_entry(),
            AnyRequest::Range(r) => r.to_entry(),
        }
    }

    /// Parse an entry as the request kind selected by `key`
    pub fn from_entry(key: &str, entry: &Entry) -> Result<Self, DecodeError> {
        match key.parse::<Key>() {
            Ok(Key::Filters) => Ok(AnyRequest::Filter(FilterRequest::from_entry(entry)?)),
            Ok(Key::Charts) => Ok(AnyRequest::Chart(ChartRequest::from_entry(entry)?)),
            Ok(Key::Ranges) => Ok(AnyRequest::Range(RangeRequest::from_entry(entry)?)),
            Ok(Key::Disabled) | Err(_) => Err(DecodeError::UnsupportedKey(key.to_string())),
        }
    }

    pub fn as_filter(&self) -> Option<&FilterRequest> {
        match self {
            AnyRequest::Filter(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartRequest> {
        match self {
            AnyRequest::Chart(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&RangeRequest> {
        match self {
            AnyRequest::Range(r) => Some(r),
            _ => None,
        }
    }
}

impl From<FilterRequest> for AnyRequest {
    fn from(value: FilterRequest) -> Self {
        AnyRequest::Filter(value)
    }
}

impl From<ChartRequest> for AnyRequest {
    fn from(value: ChartRequest) -> Self {
        AnyRequest::Chart(value)
    }
}

impl From<RangeRequest> for AnyRequest {
    fn from(value: RangeRequest) -> Self {
        AnyRequest::Range(value)
    }
}

pub(crate) fn compile(pattern: &str, case_insensitive: bool) -> Result<regex::Regex, RequestError> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| RequestError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}
