mod entity;
mod matcher;

pub use entity::{LevelDistribution, StatEntity};
pub use matcher::Matcher;

use serde::{Deserialize, Serialize};

/// Level distributions of a DLT source, grouped by id kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DltStatistic {
    pub ecu_ids: Vec<(String, LevelDistribution)>,
    pub app_ids: Vec<(String, LevelDistribution)>,
    pub context_ids: Vec<(String, LevelDistribution)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub key: String,
    pub name: String,
    pub entities: Vec<StatEntity>,
}

impl Section {
    fn new(key: &str, name: &str, ids: &[(String, LevelDistribution)]) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            entities: ids
                .iter()
                .map(|(id, distribution)| StatEntity::new(id, key, *distribution))
                .collect(),
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &StatEntity> {
        self.entities.iter().filter(|e| !e.hidden)
    }

    pub fn total(&self) -> LevelDistribution {
        let mut total = LevelDistribution::default();
        for entity in &self.entities {
            total.merge(&entity.counters);
        }
        total
    }
}

/// Statistic sections of a DLT source with a live id filter
#[derive(Debug, Clone, Default)]
pub struct StatSections {
    sections: Vec<Section>,
    filter: String,
    matcher: Matcher,
}

const SECTIONS: [(&str, &str); 3] = [
    ("ecu_ids", "ECUs"),
    ("app_ids", "Applications"),
    ("context_ids", "Contexts"),
];

fn ids_of<'a>(stat: &'a DltStatistic, key: &str) -> &'a [(String, LevelDistribution)] {
    match key {
        "ecu_ids" => &stat.ecu_ids,
        "app_ids" => &stat.app_ids,
        _ => &stat.context_ids,
    }
}

impl StatSections {
    pub fn new(stat: &DltStatistic) -> Self {
        Self {
            sections: SECTIONS
                .iter()
                .map(|(key, name)| Section::new(key, name, ids_of(stat, key)))
                .collect(),
            filter: String::new(),
            matcher: Matcher::default(),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn current_filter(&self) -> &str {
        &self.filter
    }

    /// Apply a live filter to every entity
    pub fn filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        for entity in self.sections.iter_mut().flat_map(|s| s.entities.iter_mut()) {
            entity.filter(&self.matcher, filter);
        }
    }

    /// Merge a newer statistic into the sections.
    ///
    /// Known entities keep their selection and get fresh counters; new ids are
    /// appended with the current filter applied. Ids no longer reported stay.
    pub fn update(&mut self, stat: &DltStatistic) {
        let mut added = 0;
        for section in self.sections.iter_mut() {
            for (id, distribution) in ids_of(stat, &section.key) {
                match section.entities.iter_mut().find(|e| &e.id == id) {
                    Some(entity) => entity.set_counters(*distribution),
                    None => {
                        let mut entity = StatEntity::new(id, section.key.as_str(), *distribution);
                        entity.filter(&self.matcher, &self.filter);
                        section.entities.push(entity);
                        added += 1;
                    }
                }
            }
        }
        tracing::debug!("Statistic updated, {} new ids", added);
    }

    /// Toggle selection of the entity with `hash`; returns its new state
    pub fn toggle(&mut self, hash: &str) -> Option<bool> {
        let entity = self
            .sections
            .iter_mut()
            .flat_map(|s| s.entities.iter_mut())
            .find(|e| e.hash() == hash)?;
        if entity.selected {
            entity.unselect();
        } else {
            entity.select();
        }
        Some(entity.selected)
    }

    pub fn selected(&self) -> Vec<&StatEntity> {
        self.sections
            .iter()
            .flat_map(|s| s.entities.iter())
            .filter(|e| e.selected)
            .collect()
    }

    pub fn unselect_all(&mut self) {
        for entity in self.sections.iter_mut().flat_map(|s| s.entities.iter_mut()) {
            entity.unselect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(error: usize) -> LevelDistribution {
        LevelDistribution {
            log_error: error,
            ..Default::default()
        }
    }

    fn stat() -> DltStatistic {
        DltStatistic {
            ecu_ids: vec![("ECU1".to_string(), level(1))],
            app_ids: vec![
                ("DIAG".to_string(), level(2)),
                ("NAV".to_string(), level(3)),
            ],
            context_ids: vec![("CTX".to_string(), level(4))],
        }
    }

    #[test]
    fn test_sections_built_in_order() {
        let sections = StatSections::new(&stat());
        let keys: Vec<_> = sections.sections().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["ecu_ids", "app_ids", "context_ids"]);
        assert_eq!(sections.section("app_ids").unwrap().total().log_error, 5);
    }

    #[test]
    fn test_filter_hides_but_keeps_entities() {
        let mut sections = StatSections::new(&stat());
        sections.filter("nav");

        let apps = sections.section("app_ids").unwrap();
        assert_eq!(apps.entities.len(), 2);
        let visible: Vec<_> = apps.visible().map(|e| e.id.as_str()).collect();
        assert_eq!(visible, vec!["NAV"]);
        assert_eq!(sections.section("ecu_ids").unwrap().visible().count(), 0);

        sections.filter("");
        assert_eq!(sections.section("app_ids").unwrap().visible().count(), 2);
    }

    #[test]
    fn test_update_keeps_selection_and_applies_filter() {
        let mut sections = StatSections::new(&stat());
        assert_eq!(sections.toggle("app_ids-DIAG"), Some(true));
        sections.filter("diag");

        let mut newer = stat();
        newer.app_ids[0].1 = level(10);
        newer.app_ids.push(("RADIO".to_string(), level(1)));
        sections.update(&newer);

        let apps = sections.section("app_ids").unwrap();
        assert_eq!(apps.entities.len(), 3);
        assert!(apps.entities[0].selected);
        assert_eq!(apps.entities[0].counters.log_error, 10);
        assert!(apps.entities[2].hidden);
    }

    #[test]
    fn test_selected_and_unselect_all() {
        let mut sections = StatSections::new(&stat());
        sections.toggle("ecu_ids-ECU1");
        sections.toggle("context_ids-CTX");
        assert_eq!(sections.selected().len(), 2);
        assert_eq!(sections.toggle("missing-id"), None);

        sections.unselect_all();
        assert!(sections.selected().is_empty());
    }
}
