pub mod covers;
pub mod http_fetcher;
pub mod paginated;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::Result;

/// Raw bytes of a downloaded asset.
#[derive(Debug, Clone)]
pub struct Asset {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Network seam for the fetcher and the cover pool.
#[async_trait]
pub trait Transport {
    /// POST a JSON body and decode the JSON response.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value>;

    /// Plain GET for binary assets. Non-success statuses are errors.
    async fn get_asset(&self, url: &str) -> Result<Asset>;
}

/// Observer for human-readable progress lines.
pub type Progress = Arc<dyn Fn(&str) + Send + Sync>;

pub fn silent_progress() -> Progress {
    Arc::new(|_: &str| {})
}
