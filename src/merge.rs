//! Attaches reading history to fetched lists.

use crate::domain::{CollectionList, HistoryIndex};

/// Returns a copy of `lists` where every entry with a history record carries
/// it. Entries without a match keep whatever history they had.
///
/// Applying the same index twice gives the same result as applying it once.
pub fn attach_history(lists: &[CollectionList], index: &HistoryIndex) -> Vec<CollectionList> {
    lists
        .iter()
        .map(|list| {
            let mut list = list.clone();
            for entry in &mut list.entries {
                if let Some(record) = index.get(&entry.id) {
                    entry.history = Some(record.to_read_history());
                }
            }
            list
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComicEntry, HistoryRecord, ReadHistory};

    fn lists() -> Vec<CollectionList> {
        let mut reading = CollectionList::new("1", "Reading", true);
        reading.entries.push(ComicEntry::new("c1", "Solo Leveling"));
        reading.entries.push(ComicEntry::new("c2", "Tower of God"));
        vec![reading]
    }

    fn index() -> HistoryIndex {
        let mut index = HistoryIndex::new();
        index.insert_if_absent(HistoryRecord {
            comic_id: "c1".into(),
            chapter_label: "Chapter 110".into(),
            read_timestamp: Some(1_700_000_000_000),
        });
        index
    }

    #[test]
    fn test_attaches_matching_history_only() {
        let merged = attach_history(&lists(), &index());
        assert_eq!(
            merged[0].entries[0].history,
            Some(ReadHistory {
                chapter_label: "Chapter 110".into(),
                read_timestamp: Some(1_700_000_000_000),
            })
        );
        assert!(merged[0].entries[1].history.is_none());
    }

    #[test]
    fn test_input_is_left_untouched() {
        let original = lists();
        let _ = attach_history(&original, &index());
        assert!(original[0].entries[0].history.is_none());
    }

    #[test]
    fn test_idempotent() {
        let once = attach_history(&lists(), &index());
        let twice = attach_history(&once, &index());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_structure_preserved() {
        let merged = attach_history(&lists(), &HistoryIndex::new());
        assert_eq!(merged, lists());
    }
}
