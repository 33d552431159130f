use serde::{Deserialize, Serialize};

use crate::app::{ExportError, Result};

use super::collection::CollectionList;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a merged export.
///
/// This is what the JSON artifact contains and what the editable HTML
/// embeds; `render` and `edit` read it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub source: String,
    pub display_name: String,
    pub export_date: String,
    pub lists: Vec<CollectionList>,
}

impl Snapshot {
    pub fn new(
        source: impl Into<String>,
        display_name: impl Into<String>,
        export_date: impl Into<String>,
        lists: Vec<CollectionList>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            source: source.into(),
            display_name: display_name.into(),
            export_date: export_date.into(),
            lists,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a snapshot, also accepting a bare array of lists.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
        if value.is_array() {
            let lists: Vec<CollectionList> = serde_json::from_value(value)?;
            return Ok(Self::new("", "User", "", lists));
        }
        let snapshot: Snapshot = serde_json::from_value(value)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(ExportError::Dataset(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn entry_count(&self) -> usize {
        self.lists.iter().map(|l| l.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComicEntry;

    #[test]
    fn test_reads_bare_list_array() {
        let text = r#"[{"id":"1","name":"Reading","isPublic":true,"entries":[{"id":"c1","title":"Solo Leveling"}]}]"#;
        let snapshot = Snapshot::from_json(text).unwrap();
        assert_eq!(snapshot.lists.len(), 1);
        assert_eq!(snapshot.entry_count(), 1);
        assert_eq!(snapshot.lists[0].entries[0].status, "");
    }

    #[test]
    fn test_rejects_newer_version() {
        let text = r#"{"version":99,"source":"bato","displayName":"x","exportDate":"2024-01-01","lists":[]}"#;
        assert!(matches!(
            Snapshot::from_json(text),
            Err(ExportError::Dataset(_))
        ));
    }

    #[test]
    fn test_round_trip_keeps_lists() {
        let mut list = CollectionList::new("1", "Reading", false);
        list.entries.push(ComicEntry::new("c1", "Omniscient Reader"));
        let snapshot = Snapshot::new("bato", "Alex", "2024-06-01", vec![list]);

        let text = snapshot.to_json_pretty().unwrap();
        assert_eq!(Snapshot::from_json(&text).unwrap(), snapshot);
    }
}
