use regex::RegexBuilder;

/// Case-insensitive substring matcher that highlights the first hit.
///
/// Matching is literal: the filter must occur as a contiguous substring of
/// the id. Fuzzy (subsequence) matching is not supported.
#[derive(Debug, Clone)]
pub struct Matcher {
    open: String,
    close: String,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            open: "<span>".to_string(),
            close: "</span>".to_string(),
        }
    }
}

impl Matcher {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Returns `item` with the first match of `filter` wrapped in the
    /// highlight markers, or `item` unchanged when nothing matches.
    pub fn search_single(&self, filter: &str, item: &str) -> String {
        if filter.is_empty() {
            return item.to_string();
        }
        let Ok(regex) = RegexBuilder::new(&regex::escape(filter))
            .case_insensitive(true)
            .build()
        else {
            return item.to_string();
        };
        match regex.find(item) {
            Some(m) => format!(
                "{}{}{}{}{}",
                &item[..m.start()],
                self.open,
                m.as_str(),
                self.close,
                &item[m.end()..]
            ),
            None => item.to_string(),
        }
    }
}
