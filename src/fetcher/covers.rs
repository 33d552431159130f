use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

use crate::domain::CollectionList;
use crate::fetcher::{Asset, Progress, Transport};

/// Size of the cover download pool. Fixed; not negotiated with the origin.
pub const COVER_WORKERS: usize = 5;

/// Completions between two progress reports.
const PROGRESS_EVERY: usize = 5;

#[derive(Debug)]
struct CoverJob {
    list: usize,
    entry: usize,
    path: String,
}

/// Downloads cover images for every entry that references one, with a fixed
/// number of workers pulling from one shared queue.
pub struct CoverPool {
    transport: Arc<dyn Transport + Send + Sync>,
    origin: Url,
    workers: usize,
}

impl CoverPool {
    pub fn new(transport: Arc<dyn Transport + Send + Sync>, origin: Url) -> Self {
        Self::with_workers(transport, origin, COVER_WORKERS)
    }

    pub fn with_workers(
        transport: Arc<dyn Transport + Send + Sync>,
        origin: Url,
        workers: usize,
    ) -> Self {
        Self {
            transport,
            origin,
            workers: workers.max(1),
        }
    }

    /// Returns the lists with `cover_data` filled in where a download
    /// succeeded. Failed downloads leave the entry without an embedded cover.
    /// Resolves only after every worker has drained the queue.
    pub async fn enrich_covers(
        &self,
        mut lists: Vec<CollectionList>,
        progress: &Progress,
    ) -> Vec<CollectionList> {
        let jobs: VecDeque<CoverJob> = lists
            .iter()
            .enumerate()
            .flat_map(|(li, list)| {
                list.entries.iter().enumerate().filter_map(move |(ei, entry)| {
                    entry.cover_url.as_ref().map(|path| CoverJob {
                        list: li,
                        entry: ei,
                        path: path.clone(),
                    })
                })
            })
            .collect();

        let total = jobs.len();
        progress(&format!("Downloading covers: 0/{}", total));
        if total == 0 {
            return lists;
        }

        let queue = Arc::new(Mutex::new(jobs));
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..self.workers)
            .map(|_| {
                let queue = queue.clone();
                let completed = completed.clone();
                let transport = self.transport.clone();
                let origin = self.origin.clone();
                let progress = progress.clone();

                tokio::spawn(async move {
                    let mut results = Vec::new();
                    // The lock guard is dropped before the next await.
                    while let Some(job) = pop_job(&queue) {
                        let data = fetch_cover(transport.as_ref(), &origin, &job.path).await;

                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        if done % PROGRESS_EVERY == 0 || done == total {
                            progress(&format!("Downloading covers: {}/{}", done, total));
                        }
                        results.push((job, data));
                    }
                    results
                })
            })
            .collect();

        let mut embedded = 0;
        let mut settled = 0;
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(results) => {
                    settled += results.len();
                    for (job, data) in results {
                        embedded += usize::from(data.is_some());
                        lists[job.list].entries[job.entry].cover_data = data;
                    }
                }
                Err(e) => {
                    tracing::error!("Cover worker join error: {}", e);
                }
            }
        }

        // Jobs of a failed worker never come back, fetched or not.
        let lost = total - settled;
        if lost > 0 {
            tracing::warn!(
                "Embedded {}/{} covers; {} lost to a failed download worker",
                embedded,
                total,
                lost
            );
            progress(&format!(
                "Embedded {}/{} covers ({} lost: a download worker failed)",
                embedded, total, lost
            ));
        } else {
            tracing::info!("Embedded {}/{} covers", embedded, total);
        }
        lists
    }
}

fn pop_job(queue: &Mutex<VecDeque<CoverJob>>) -> Option<CoverJob> {
    match queue.lock() {
        Ok(mut jobs) => jobs.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

async fn fetch_cover(
    transport: &(dyn Transport + Send + Sync),
    origin: &Url,
    path: &str,
) -> Option<String> {
    let url = match origin.join(path) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Bad cover path {}: {}", path, e);
            return None;
        }
    };

    match transport.get_asset(url.as_str()).await {
        Ok(asset) if !asset.body.is_empty() => Some(to_data_url(&asset)),
        Ok(_) => {
            tracing::warn!("Empty cover body from {}", url);
            None
        }
        Err(e) => {
            tracing::warn!("Cover download failed for {}: {}", url, e);
            None
        }
    }
}

/// Encode an asset as a `data:` URL, trusting an `image/*` content type and
/// sniffing the bytes otherwise.
pub fn to_data_url(asset: &Asset) -> String {
    let mime = asset
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or_else(|| sniff_image_mime(&asset.body));
    format!("data:{};base64,{}", mime, STANDARD.encode(&asset.body))
}

pub fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

/// Split a base64 `data:` URL into its MIME type and decoded bytes.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime.to_string(), bytes))
}
