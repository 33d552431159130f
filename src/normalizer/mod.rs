//! Converts raw GraphQL payloads into the collection model.
//!
//! The origin exposes several synonymous fields for some attributes; each is
//! resolved here once, by a fixed precedence, so generators only ever see
//! one normalized value.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::app::Result;
use crate::domain::{CollectionList, ComicEntry, HistoryRecord};

pub const LIST_QUERY_NAME: &str = "get_user_mylistList";
pub const HISTORY_QUERY_NAME: &str = "get_sser_myHistory";

#[derive(Debug, Default, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub paging: Option<Paging>,
    #[serde(default)]
    pub items: Option<Vec<RawList>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub pages: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RawList {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<RawListData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub comic_nodes: Option<Vec<RawNode>>,
}

#[derive(Debug, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub data: Option<RawComic>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawComic {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "urlPath")]
    pub url_path: Option<String>,
    #[serde(default, rename = "urlCover600")]
    pub url_cover600: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score_avg: Option<f64>,
    #[serde(default, rename = "uploadStatus")]
    pub upload_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "originalStatus")]
    pub original_status: Option<String>,
    #[serde(default, rename = "origLang")]
    pub orig_lang: Option<String>,
    #[serde(default, rename = "dateUpdate", deserialize_with = "lenient_i64")]
    pub date_update: Option<i64>,
    #[serde(default, rename = "dateModify", deserialize_with = "lenient_i64")]
    pub date_modify: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub chaps_normal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    /// Opaque cursor for the next page, passed back verbatim.
    #[serde(default)]
    pub new_start: Option<Value>,
    #[serde(default)]
    pub items: Option<Vec<RawHistoryItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistoryItem {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub date: Option<i64>,
    #[serde(default)]
    pub comic_node: Option<RawRef>,
    #[serde(default)]
    pub chapter_node: Option<RawChapterNode>,
}

#[derive(Debug, Deserialize)]
pub struct RawRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawChapterNode {
    #[serde(default)]
    pub data: Option<RawChapter>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawChapter {
    #[serde(default)]
    pub dname: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub order: Option<String>,
}

/// First candidate that is present and not blank.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Extract `data.<query>` from a GraphQL response.
    ///
    /// A missing or null payload is end-of-data, not an error; any GraphQL
    /// errors that came along are logged.
    pub fn query_payload<'a>(&self, response: &'a Value, query: &str) -> Option<&'a Value> {
        let payload = response
            .get("data")
            .and_then(|d| d.get(query))
            .filter(|v| !v.is_null());

        if payload.is_none() {
            if let Some(errors) = response.get("errors").and_then(Value::as_array) {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect();
                tracing::warn!("{} returned errors: {}", query, messages.join("; "));
            }
        }
        payload
    }

    pub fn list_page(&self, response: &Value) -> Result<Option<ListPage>> {
        match self.query_payload(response, LIST_QUERY_NAME) {
            Some(payload) => Ok(Some(ListPage::deserialize(payload)?)),
            None => Ok(None),
        }
    }

    pub fn history_page(&self, response: &Value) -> Result<Option<HistoryPage>> {
        match self.query_payload(response, HISTORY_QUERY_NAME) {
            Some(payload) => Ok(Some(HistoryPage::deserialize(payload)?)),
            None => Ok(None),
        }
    }

    pub fn normalize_list(&self, raw: RawList) -> CollectionList {
        let data = raw.data.unwrap_or_default();
        let mut list = CollectionList::new(
            raw.id.unwrap_or_default(),
            data.name.unwrap_or_default(),
            data.is_public.unwrap_or(false),
        );

        let mut seen = HashSet::new();
        for node in data.comic_nodes.unwrap_or_default() {
            let Some(entry) = node.data.and_then(|c| self.normalize_comic(c)) else {
                continue;
            };
            if seen.insert(entry.id.clone()) {
                list.entries.push(entry);
            } else {
                tracing::debug!("Dropping duplicate comic {} in list {}", entry.id, list.name);
            }
        }
        list
    }

    /// `None` when the comic carries no id.
    pub fn normalize_comic(&self, raw: RawComic) -> Option<ComicEntry> {
        let id = raw.id.filter(|id| !id.is_empty())?;
        let mut entry = ComicEntry::new(id, raw.name.unwrap_or_default());

        entry.status = first_non_empty([
            raw.upload_status.as_deref(),
            raw.status.as_deref(),
            raw.original_status.as_deref(),
        ])
        .unwrap_or_default()
        .to_string();
        entry.last_updated_timestamp = raw.date_update.or(raw.date_modify);
        entry.origin_language = raw.orig_lang.unwrap_or_default();
        entry.genres = dedup_preserving_order(raw.genres);
        entry.authors = raw.authors;
        entry.average_score = raw.score_avg;
        entry.latest_chapter_label = raw.chaps_normal.filter(|c| !c.is_empty());
        entry.source_path = raw.url_path.unwrap_or_default();
        entry.cover_url = raw.url_cover600.filter(|u| !u.trim().is_empty());

        Some(entry)
    }

    /// `None` for items without a comic id or chapter data.
    pub fn history_record(&self, item: RawHistoryItem) -> Option<HistoryRecord> {
        let comic_id = item.comic_node.and_then(|n| n.id).filter(|id| !id.is_empty())?;
        let chapter = item.chapter_node.and_then(|n| n.data)?;

        let chapter_label = match first_non_empty([chapter.dname.as_deref(), chapter.title.as_deref()]) {
            Some(label) => label.to_string(),
            None => format!("Ch.{}", chapter.order.as_deref().unwrap_or("?")),
        };

        Some(HistoryRecord {
            comic_id,
            chapter_label,
            read_timestamp: item.date,
        })
    }
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
