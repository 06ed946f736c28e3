use serde::{Deserialize, Serialize};

/// Persisted form of a request: its uuid and a JSON document describing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub uuid: String,
    pub content: String,
}

impl Entry {
    pub fn new(uuid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            content: content.into(),
        }
    }
}
