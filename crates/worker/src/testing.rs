//! Test doubles shared by the worker's policy tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url, header};

use appshell_client::{FetchedAsset, Fetcher};
use appshell_core::{AssetEntry, Error};

/// Scripted [`Fetcher`] that serves canned responses and records calls.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    failures: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    /// Script a response for a URL.
    pub fn ok(&self, url: &str, status: u16, body: &[u8]) {
        self.responses.lock().unwrap().insert(url.to_string(), (status, body.to_vec()));
    }

    /// Script a network-level failure for a URL.
    pub fn fail(&self, url: &str) {
        self.failures.lock().unwrap().insert(url.to_string());
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &Url, _bypass_http_cache: bool) -> Result<FetchedAsset, Error> {
        let url_str = url.to_string();
        self.calls.lock().unwrap().push(url_str.clone());

        if self.failures.lock().unwrap().contains(&url_str) {
            return Err(Error::NetworkFetch(format!("{url_str}: connection refused")));
        }

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .get(&url_str)
            .cloned()
            .ok_or_else(|| Error::NetworkFetch(format!("{url_str}: no scripted response")))?;

        Ok(FetchedAsset {
            url: url.clone(),
            status: StatusCode::from_u16(status).unwrap(),
            content_type: Some("application/octet-stream".to_string()),
            headers: header::HeaderMap::new(),
            bytes: Bytes::from(body),
        })
    }
}

/// A content-cache row as the worker itself would have stored it.
pub fn entry(key: &str, url: &str, body: &[u8]) -> AssetEntry {
    AssetEntry {
        key: key.to_string(),
        url: url.to_string(),
        status: 200,
        content_type: Some("application/octet-stream".to_string()),
        headers_json: None,
        body: body.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}
