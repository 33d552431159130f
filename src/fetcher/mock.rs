//! In-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::{ExportError, Result};
use crate::fetcher::{Asset, Transport};

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Value>>,
    assets: Mutex<HashMap<String, Vec<u8>>>,
    posted: Mutex<Vec<Value>>,
    fetched: Mutex<Vec<String>>,
    asset_delay: Option<Duration>,
    panic_url: Option<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses are handed out in order, one per `post_json`.
    pub fn with_responses(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn with_asset_delay(mut self, delay: Duration) -> Self {
        self.asset_delay = Some(delay);
        self
    }

    /// Panic inside `get_asset` for `url`, killing the calling task.
    pub fn with_panic_on(mut self, url: &str) -> Self {
        self.panic_url = Some(url.to_string());
        self
    }

    pub fn add_asset(&self, url: &str, body: &[u8]) {
        self.assets.lock().unwrap().insert(url.to_string(), body.to_vec());
    }

    pub fn posted(&self) -> Vec<Value> {
        self.posted.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Highest number of asset requests observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, _url: &str, body: &Value) -> Result<Value> {
        self.posted.lock().unwrap().push(body.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExportError::Other("no scripted response left".into()))
    }

    async fn get_asset(&self, url: &str) -> Result<Asset> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.panic_url.as_deref() == Some(url) {
            panic!("scripted transport failure for {}", url);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.asset_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let body = self.assets.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => Ok(Asset {
                body,
                content_type: None,
            }),
            None => Err(ExportError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
