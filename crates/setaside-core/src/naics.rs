//! NAICS code → industry description lookup.

use std::collections::HashMap;

/// Label given to records whose NAICS code is empty or not in the table.
pub const OTHER_LABEL: &str = "Other";

/// Codes known out of the box. Deployments extend or replace these through
/// configuration rather than code.
const BUILTIN: &[(&str, &str)] = &[
    ("541511", "Custom Computer Programming"),
    ("541512", "Systems Design Services"),
    ("561730", "Landscaping Services"),
];

/// Static mapping from NAICS code to a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaicsTable {
    labels: HashMap<String, String>,
}

impl Default for NaicsTable {
    fn default() -> Self {
        Self::from_map(
            BUILTIN
                .iter()
                .map(|(code, label)| (code.to_string(), label.to_string()))
                .collect(),
        )
    }
}

impl NaicsTable {
    /// Build a table from an explicit code → label map.
    ///
    /// Codes are trimmed so that table keys match trimmed record codes.
    pub fn from_map(labels: HashMap<String, String>) -> Self {
        let labels = labels
            .into_iter()
            .map(|(code, label)| (code.trim().to_string(), label))
            .collect();
        Self { labels }
    }

    /// Describe a code, falling back to [`OTHER_LABEL`].
    pub fn describe(&self, code: &str) -> &str {
        if code.is_empty() {
            return OTHER_LABEL;
        }
        self.labels
            .get(code)
            .map(String::as_str)
            .unwrap_or(OTHER_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
