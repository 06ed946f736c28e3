use regex::Regex;
use serde::{Deserialize, Serialize};

use super::filter::default_active;
use super::{Activatable, DecodeError, Request, RequestError, active_info, compile};
use crate::storage::Entry;
use crate::types::{Guid, Key};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Linear,
    Stepped,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartWidths {
    pub line: u32,
    pub point: u32,
}

impl Default for ChartWidths {
    fn default() -> Self {
        Self { line: 1, point: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDefinition {
    /// Regex whose first capture group yields the plotted value
    pub filter: String,
    pub color: String,
    #[serde(default)]
    pub widths: ChartWidths,
    #[serde(default, rename = "type")]
    pub chart_type: ChartType,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    uuid: Guid,
    #[serde(flatten)]
    definition: ChartDefinition,
}

impl ChartRequest {
    pub fn new(filter: impl Into<String>, color: impl Into<String>) -> Result<Self, RequestError> {
        Self::from_definition(
            Guid::generate(),
            ChartDefinition {
                filter: filter.into(),
                color: color.into(),
                widths: ChartWidths::default(),
                chart_type: ChartType::default(),
                active: true,
            },
        )
    }

    pub fn from_definition(uuid: Guid, definition: ChartDefinition) -> Result<Self, RequestError> {
        Self::validate(&definition.filter)?;
        Ok(Self { uuid, definition })
    }

    fn validate(filter: &str) -> Result<Regex, RequestError> {
        if filter.is_empty() {
            return Err(RequestError::EmptyFilter);
        }
        let regex = compile(filter, true)?;
        if regex.captures_len() < 2 {
            return Err(RequestError::NoCaptureGroup(filter.to_string()));
        }
        Ok(regex)
    }

    pub fn definition(&self) -> &ChartDefinition {
        &self.definition
    }

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.definition.chart_type = chart_type;
    }

    pub fn set_widths(&mut self, widths: ChartWidths) {
        self.definition.widths = widths;
    }

    pub fn as_regex(&self) -> Result<Regex, RequestError> {
        Self::validate(&self.definition.filter)
    }

    /// Extract the plotted value from a line, if the line matches
    pub fn value(&self, regex: &Regex, line: &str) -> Option<f64> {
        regex
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().trim().parse().ok())
    }
}

impl Request for ChartRequest {
    const KEY: Key = Key::Charts;

    fn uuid(&self) -> &Guid {
        &self.uuid
    }

    fn hash(&self) -> String {
        self.definition.filter.clone()
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
        let definition: ChartDefinition = serde_json::from_str(&entry.content)?;
        Ok(Self::from_definition(Guid::new(&entry.uuid), definition)?)
    }
}

impl Activatable for ChartRequest {
    fn is_active(&self) -> bool {
        self.definition.active
    }

    fn set_active(&mut self, active: bool) {
        self.definition.active = active;
    }
}
