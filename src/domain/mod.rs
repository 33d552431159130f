pub mod collection;
pub mod display;
pub mod editable;
pub mod history;
pub mod snapshot;

pub use collection::{CollectionList, ComicEntry, ReadHistory};
pub use editable::{EditableDataset, EntryPatch};
pub use history::{HistoryIndex, HistoryRecord};
pub use snapshot::Snapshot;
