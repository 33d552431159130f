use sha2::{Digest, Sha256};

use crate::app::{ExportError, Result};

use super::collection::{CollectionList, ComicEntry, ReadHistory};
use super::snapshot::Snapshot;

/// Field changes for an entry. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub title: Option<String>,
    /// Target list name; moving an entry appends it to that list.
    pub list: Option<String>,
    pub origin_language: Option<String>,
    pub status: Option<String>,
    pub genres: Option<Vec<String>>,
    pub authors: Option<Vec<String>>,
    pub average_score: Option<f64>,
    pub latest_chapter_label: Option<String>,
    pub source_path: Option<String>,
    pub cover_url: Option<String>,
    pub history: Option<ReadHistory>,
}

impl EntryPatch {
    fn apply(&self, entry: &mut ComicEntry) {
        if let Some(title) = &self.title {
            entry.title = title.clone();
        }
        if let Some(lang) = &self.origin_language {
            entry.origin_language = lang.clone();
        }
        if let Some(status) = &self.status {
            entry.status = status.clone();
        }
        if let Some(genres) = &self.genres {
            entry.genres = genres.clone();
        }
        if let Some(authors) = &self.authors {
            entry.authors = authors.clone();
        }
        if let Some(score) = self.average_score {
            entry.average_score = Some(score);
        }
        if let Some(label) = &self.latest_chapter_label {
            entry.latest_chapter_label = Some(label.clone()).filter(|l| !l.is_empty());
        }
        if let Some(path) = &self.source_path {
            entry.source_path = path.clone();
        }
        if let Some(url) = &self.cover_url {
            entry.cover_url = Some(url.clone()).filter(|u| !u.is_empty());
            entry.cover_data = None;
        }
        if let Some(history) = &self.history {
            entry.history = Some(history.clone());
        }
    }
}

/// Mutable working copy of a snapshot.
///
/// The browser client in the editable HTML performs the same operations on
/// the same serialized shape.
#[derive(Debug, Clone)]
pub struct EditableDataset {
    snapshot: Snapshot,
    seq: u64,
}

impl EditableDataset {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot, seq: 0 }
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn lists(&self) -> &[CollectionList] {
        &self.snapshot.lists
    }

    /// Locate an entry across all lists: `(list index, entry index)`.
    pub fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.snapshot
            .lists
            .iter()
            .enumerate()
            .find_map(|(li, list)| {
                list.entries
                    .iter()
                    .position(|e| e.id == id)
                    .map(|ei| (li, ei))
            })
    }

    pub fn get(&self, id: &str) -> Option<&ComicEntry> {
        self.locate(id)
            .map(|(li, ei)| &self.snapshot.lists[li].entries[ei])
    }

    /// Add a new entry to `list_name` and return its generated id.
    pub fn add(&mut self, list_name: &str, patch: &EntryPatch) -> Result<String> {
        let title = patch
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ExportError::Dataset("a title is required".into()))?;

        let id = self.next_id(list_name, title);
        let mut entry = ComicEntry::new(id.clone(), title);
        patch.apply(&mut entry);

        let li = self.list_index_or_create(list_name);
        self.snapshot.lists[li].entries.push(entry);
        Ok(id)
    }

    /// Update an entry in place, relocating it when `patch.list` names a
    /// different list.
    pub fn edit(&mut self, id: &str, patch: &EntryPatch) -> Result<()> {
        let (li, ei) = self
            .locate(id)
            .ok_or_else(|| ExportError::Dataset(format!("entry not found: {}", id)))?;

        patch.apply(&mut self.snapshot.lists[li].entries[ei]);

        if let Some(target) = patch.list.as_deref() {
            if self.snapshot.lists[li].name != target {
                let entry = self.snapshot.lists[li].entries.remove(ei);
                let target_idx = self.list_index_or_create(target);
                self.snapshot.lists[target_idx].entries.push(entry);
            }
        }
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<ComicEntry> {
        let (li, ei) = self
            .locate(id)
            .ok_or_else(|| ExportError::Dataset(format!("entry not found: {}", id)))?;
        Ok(self.snapshot.lists[li].entries.remove(ei))
    }

    fn list_index_or_create(&mut self, name: &str) -> usize {
        if let Some(idx) = self.snapshot.lists.iter().position(|l| l.name == name) {
            return idx;
        }
        let id = format!("local-list-{}", self.snapshot.lists.len() + 1);
        self.snapshot
            .lists
            .push(CollectionList::new(id, name, false));
        self.snapshot.lists.len() - 1
    }

    fn next_id(&mut self, list_name: &str, title: &str) -> String {
        loop {
            self.seq += 1;
            let id = Self::generate_id(list_name, title, self.seq);
            if self.locate(&id).is_none() {
                return id;
            }
        }
    }

    /// Deterministic synthetic id: `local-` plus 12 hex chars.
    pub fn generate_id(list_name: &str, title: &str, seq: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(list_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(title.as_bytes());
        hasher.update(seq.to_le_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("local-{}", &digest[..12])
    }
}
