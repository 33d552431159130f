use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::collection::ReadHistory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub comic_id: String,
    pub chapter_label: String,
    pub read_timestamp: Option<i64>,
}

impl HistoryRecord {
    pub fn to_read_history(&self) -> ReadHistory {
        ReadHistory {
            chapter_label: self.chapter_label.clone(),
            read_timestamp: self.read_timestamp,
        }
    }
}

/// Lookup from comic id to its most recent read event.
///
/// History pages arrive newest-first, so the first record seen for an id is
/// kept and later ones are discarded.
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    records: HashMap<String, HistoryRecord>,
}

impl HistoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when a record for this comic is already present.
    pub fn insert_if_absent(&mut self, record: HistoryRecord) -> bool {
        if self.records.contains_key(&record.comic_id) {
            return false;
        }
        self.records.insert(record.comic_id.clone(), record);
        true
    }

    pub fn get(&self, comic_id: &str) -> Option<&HistoryRecord> {
        self.records.get(comic_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
