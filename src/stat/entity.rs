use serde::{Deserialize, Serialize};

use super::Matcher;

/// Message count per DLT log level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDistribution {
    pub non_log: usize,
    pub log_fatal: usize,
    pub log_error: usize,
    pub log_warning: usize,
    pub log_info: usize,
    pub log_debug: usize,
    pub log_verbose: usize,
    pub log_invalid: usize,
}

impl LevelDistribution {
    pub fn total(&self) -> usize {
        self.non_log
            + self.log_fatal
            + self.log_error
            + self.log_warning
            + self.log_info
            + self.log_debug
            + self.log_verbose
            + self.log_invalid
    }

    pub fn merge(&mut self, other: &LevelDistribution) {
        self.non_log += other.non_log;
        self.log_fatal += other.log_fatal;
        self.log_error += other.log_error;
        self.log_warning += other.log_warning;
        self.log_info += other.log_info;
        self.log_debug += other.log_debug;
        self.log_verbose += other.log_verbose;
        self.log_invalid += other.log_invalid;
    }
}

/// Level counters of one ECU, application or context id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatEntity {
    pub id: String,
    pub parent: String,
    pub counters: LevelDistribution,
    pub selected: bool,
    pub hidden: bool,
    html_id: String,
}

impl StatEntity {
    pub fn new(id: impl Into<String>, parent: impl Into<String>, from: LevelDistribution) -> Self {
        let id = id.into();
        Self {
            html_id: id.clone(),
            id,
            parent: parent.into(),
            counters: from,
            selected: false,
            hidden: false,
        }
    }

    /// Id with the current filter match highlighted
    pub fn html_id(&self) -> &str {
        &self.html_id
    }

    pub fn hash(&self) -> String {
        format!("{}-{}", self.parent, self.id)
    }

    pub fn equal(&self, other: &StatEntity) -> bool {
        self.hash() == other.hash()
    }

    pub fn select(&mut self) {
        self.selected = true;
    }

    pub fn unselect(&mut self) {
        self.selected = false;
    }

    pub fn set_counters(&mut self, counters: LevelDistribution) {
        self.counters = counters;
    }

    /// Hide the entity when a non-empty filter does not match its id
    pub fn filter(&mut self, matcher: &Matcher, filter: &str) {
        let id = matcher.search_single(filter, &self.id);
        if id == self.id && !filter.is_empty() {
            self.hidden = true;
        } else {
            self.hidden = false;
            self.html_id = id;
        }
    }
}
