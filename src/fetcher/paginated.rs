use std::sync::Arc;

use serde_json::{json, Value};

use crate::app::Result;
use crate::config::FetchConfig;
use crate::domain::{CollectionList, HistoryIndex};
use crate::fetcher::{Progress, Transport};
use crate::normalizer::Normalizer;

const HISTORY_QUERY: &str = r#"
query get_sser_myHistory($select: Sser_MyHistory_Select) {
    get_sser_myHistory(select: $select) {
        reqLimit
        newStart
        items {
            date
            comicNode { id }
            chapterNode { data { dname title order } }
        }
    }
}"#;

fn list_query(comic_limit: u32) -> String {
    format!(
        r#"
query get_user_mylistList($select: MylistList_Select) {{
    get_user_mylistList(select: $select) {{
        paging {{ total pages page init size skip limit prev next }}
        items {{
            id
            data {{
                name
                isPublic
                comicNodes(amount: {comic_limit}) {{
                    data {{
                        id name urlPath urlCover600 genres authors score_avg
                        uploadStatus status originalStatus origLang
                        dateUpdate dateModify chaps_normal
                    }}
                }}
            }}
        }}
    }}
}}"#
    )
}

/// Sequential pager over the list and history queries.
///
/// Every page is awaited before the next request is issued.
pub struct PaginatedFetcher {
    transport: Arc<dyn Transport + Send + Sync>,
    endpoint: String,
    settings: FetchConfig,
    normalizer: Normalizer,
}

impl PaginatedFetcher {
    pub fn new(
        transport: Arc<dyn Transport + Send + Sync>,
        endpoint: impl Into<String>,
        settings: FetchConfig,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            settings,
            normalizer: Normalizer::new(),
        }
    }

    /// Fetch every collection list of `user_id`, in paging order.
    ///
    /// A page without an items field ends the walk and the lists gathered so
    /// far are returned.
    pub async fn fetch_all_lists(
        &self,
        user_id: &str,
        progress: &Progress,
    ) -> Result<Vec<CollectionList>> {
        let query = list_query(self.settings.comic_limit);
        let mut lists = Vec::new();
        let mut page: i64 = 1;

        loop {
            let body = json!({
                "query": query,
                "variables": {
                    "select": {
                        "page": page,
                        "size": self.settings.page_size,
                        "sortby": self.settings.sort,
                        "userId": user_id,
                    }
                }
            });
            let response = self.transport.post_json(&self.endpoint, &body).await?;

            let Some(data) = self.normalizer.list_page(&response)? else {
                tracing::debug!("List page {} has no payload; stopping", page);
                break;
            };
            let Some(items) = data.items else {
                tracing::debug!("List page {} has no items; stopping", page);
                break;
            };
            let total_pages = data.paging.and_then(|p| p.pages).unwrap_or(page);

            lists.extend(items.into_iter().map(|raw| self.normalizer.normalize_list(raw)));
            progress(&format!(
                "Fetched lists page {}/{} ({} lists)",
                page,
                total_pages.max(page),
                lists.len()
            ));

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::info!("Fetched {} lists in {} page(s)", lists.len(), page);
        Ok(lists)
    }

    /// Walk the reading history by cursor and index the newest read per comic.
    ///
    /// Stops on an empty page, a missing cursor, or after
    /// `max_history_pages` pages.
    pub async fn fetch_history_index(&self, progress: &Progress) -> Result<HistoryIndex> {
        let mut index = HistoryIndex::new();
        let mut cursor = Value::Null;
        let mut page: u32 = 1;

        loop {
            if page > self.settings.max_history_pages {
                tracing::info!(
                    "History walk stopped at the {}-page limit; older reads are not included",
                    self.settings.max_history_pages
                );
                break;
            }

            let body = json!({
                "query": HISTORY_QUERY,
                "variables": {
                    "select": {
                        "limit": self.settings.history_limit,
                        "start": cursor,
                    }
                }
            });
            let response = self.transport.post_json(&self.endpoint, &body).await?;

            let Some(data) = self.normalizer.history_page(&response)? else {
                break;
            };
            let items = data.items.unwrap_or_default();
            if items.is_empty() {
                break;
            }

            let mut added = 0;
            for item in items {
                if let Some(record) = self.normalizer.history_record(item) {
                    if index.insert_if_absent(record) {
                        added += 1;
                    }
                }
            }
            tracing::debug!("History page {}: {} new comics", page, added);
            progress(&format!(
                "Fetched history page {} ({} comics)",
                page,
                index.len()
            ));

            cursor = match data.new_start {
                None | Some(Value::Null) => break,
                Some(Value::String(s)) if s.is_empty() => break,
                Some(next) => next,
            };
            page += 1;
        }

        Ok(index)
    }
}
