use serde::{Deserialize, Serialize};

use super::filter::default_active;
use super::{Activatable, DecodeError, FilterRequest, Request, RequestError, active_info};
use crate::storage::Entry;
use crate::types::{Guid, Key};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDefinition {
    pub start: FilterRequest,
    pub end: FilterRequest,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_color() -> String {
    "#CCCCCC".to_string()
}

/// Time range between the lines matched by two marker filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRequest {
    uuid: Guid,
    #[serde(flatten)]
    definition: RangeDefinition,
}

impl RangeRequest {
    pub fn new(start: FilterRequest, end: FilterRequest) -> Result<Self, RequestError> {
        Self::from_definition(
            Guid::generate(),
            RangeDefinition {
                start,
                end,
                color: default_color(),
                active: true,
            },
        )
    }

    /// Build a range from a selection, which must hold exactly two filters
    pub fn from_filters(filters: &[FilterRequest]) -> Result<Self, RequestError> {
        match filters {
            [start, end] => Self::new(start.clone(), end.clone()),
            _ => Err(RequestError::RangePoints(filters.len())),
        }
    }

    pub fn from_definition(uuid: Guid, definition: RangeDefinition) -> Result<Self, RequestError> {
        definition.start.as_regex()?;
        definition.end.as_regex()?;
        if definition.start.is_same(&definition.end) {
            return Err(RequestError::RangeSamePoints);
        }
        Ok(Self { uuid, definition })
    }

    pub fn definition(&self) -> &RangeDefinition {
        &self.definition
    }

    pub fn start(&self) -> &FilterRequest {
        &self.definition.start
    }

    pub fn end(&self) -> &FilterRequest {
        &self.definition.end
    }
}

impl Request for RangeRequest {
    const KEY: Key = Key::Ranges;

    fn uuid(&self) -> &Guid {
        &self.uuid
    }

    // Start is length-prefixed: filter text may contain any separator
    fn hash(&self) -> String {
        let start = self.definition.start.hash();
        format!("{}:{}>{}", start.len(), start, self.definition.end.hash())
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
        let definition: RangeDefinition = serde_json::from_str(&entry.content)?;
        Ok(Self::from_definition(Guid::new(&entry.uuid), definition)?)
    }
}

impl Activatable for RangeRequest {
    fn is_active(&self) -> bool {
        self.definition.active
    }

    fn set_active(&mut self, active: bool) {
        self.definition.active = active;
    }
}
