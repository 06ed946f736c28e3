use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Activatable, DecodeError, Request, RequestError, active_info, compile};
use crate::storage::Entry;
use crate::types::{Guid, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterFlags {
    /// Case sensitive
    pub cases: bool,
    /// Treat the filter as a regular expression
    pub reg: bool,
    /// Whole word only
    pub word: bool,
}

impl Default for FilterFlags {
    fn default() -> Self {
        Self {
            cases: false,
            reg: true,
            word: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub filter: String,
    pub flags: FilterFlags,
}

impl SearchFilter {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            flags: FilterFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: FilterFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Regex matching exactly what this filter matches
    pub fn as_regex(&self) -> Result<Regex, RequestError> {
        if self.filter.is_empty() {
            return Err(RequestError::EmptyFilter);
        }
        let body = if self.flags.reg {
            self.filter.clone()
        } else {
            regex::escape(&self.filter)
        };
        let body = if self.flags.word {
            format!(r"\b(?:{body})\b")
        } else {
            body
        };
        compile(&body, !self.flags.cases)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterColors {
    pub color: String,
    pub background: String,
}

impl Default for FilterColors {
    fn default() -> Self {
        Self {
            color: "#FFFFFF".to_string(),
            background: "#2B579A".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub filter: SearchFilter,
    #[serde(default)]
    pub colors: FilterColors,
    #[serde(default = "default_active")]
    pub active: bool,
}

pub(crate) fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    uuid: Guid,
    #[serde(flatten)]
    definition: FilterDefinition,
}

impl FilterRequest {
    pub fn new(filter: SearchFilter) -> Result<Self, RequestError> {
        Self::from_definition(
            Guid::generate(),
            FilterDefinition {
                filter,
                colors: FilterColors::default(),
                active: true,
            },
        )
    }

    pub fn from_definition(uuid: Guid, definition: FilterDefinition) -> Result<Self, RequestError> {
        definition.filter.as_regex()?;
        Ok(Self { uuid, definition })
    }

    pub fn with_colors(mut self, colors: FilterColors) -> Self {
        self.definition.colors = colors;
        self
    }

    pub fn definition(&self) -> &FilterDefinition {
        &self.definition
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.definition.filter
    }

    /// Replace the search part of the definition, keeping uuid and colors
    pub fn set_filter(&mut self, filter: SearchFilter) -> Result<(), RequestError> {
        filter.as_regex()?;
        self.definition.filter = filter;
        Ok(())
    }

    pub fn as_regex(&self) -> Result<Regex, RequestError> {
        self.definition.filter.as_regex()
    }
}

impl Request for FilterRequest {
    const KEY: Key = Key::Filters;

    fn uuid(&self) -> &Guid {
        &self.uuid
    }

    fn hash(&self) -> String {
        let filter = &self.definition.filter;
        format!(
            "{}|{}|{}|{}",
            filter.filter, filter.flags.cases, filter.flags.reg, filter.flags.word
        )
    }

    fn info(requests: &[Self]) -> Vec<String> {
        active_info(requests)
    }

    fn to_entry(&self) -> serde_json::Result<Entry> {
        Ok(Entry::new(
            self.uuid.as_str(),
            serde_json::to_string(&self.definition)?,
        ))
    }

    fn from_entry(entry: &Entry) -> Result<Self, DecodeError> {
        let definition: FilterDefinition = serde_json::from_str(&entry.content)?;
        Ok(Self::from_definition(Guid::new(&entry.uuid), definition)?)
    }
}

impl Activatable for FilterRequest {
    fn is_active(&self) -> bool {
        self.definition.active
    }

    fn set_active(&mut self, active: bool) {
        self.definition.active = active;
    }
}
