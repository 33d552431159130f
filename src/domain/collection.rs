use serde::{Deserialize, Serialize};

/// A named, user-defined grouping of tracked comics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionList {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    pub entries: Vec<ComicEntry>,
}

impl CollectionList {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_public: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_public,
            entries: Vec::new(),
        }
    }

    pub fn privacy_label(&self) -> &'static str {
        if self.is_public {
            "Public"
        } else {
            "Private"
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One tracked comic inside a list.
///
/// Optional fields serialize as `null` so the JSON snapshot always carries
/// the full shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub origin_language: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub latest_chapter_label: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_updated_timestamp: Option<i64>,
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Cover image as a `data:` URL, attached by the enrichment pool.
    #[serde(default)]
    pub cover_data: Option<String>,
    #[serde(default)]
    pub history: Option<ReadHistory>,
}

impl ComicEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            origin_language: String::new(),
            genres: Vec::new(),
            authors: Vec::new(),
            average_score: None,
            status: String::new(),
            latest_chapter_label: None,
            last_updated_timestamp: None,
            source_path: String::new(),
            cover_url: None,
            cover_data: None,
            history: None,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Best image source for rendering: embedded data first, then the remote URL.
    pub fn image_source(&self) -> Option<&str> {
        self.cover_data.as_deref().or(self.cover_url.as_deref())
    }
}

/// Most recent read event attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadHistory {
    pub chapter_label: String,
    /// Milliseconds since the Unix epoch.
    pub read_timestamp: Option<i64>,
}
