//! Per-request interception policy.
//!
//! Decides, per request, between pass-through, online-first (root
//! document), and cache-first-with-lazy-fill (everything else in the
//! catalog). The interceptor only reads the content cache and
//! opportunistically inserts; membership transitions belong to the
//! reconciliation engine.

use std::sync::Arc;

use tracing::debug;

use appshell_client::Fetcher;
use appshell_core::catalog::{Catalog, ROOT_KEY, keys};
use appshell_core::{AssetEntry, CachePartition, Error};

use crate::response;

/// Request-time cache policy over the reconciled content cache.
pub struct Interceptor<F> {
    catalog: Arc<Catalog>,
    content: CachePartition,
    fetcher: Arc<F>,
    origin: String,
}

impl<F: Fetcher> Interceptor<F> {
    pub fn new(catalog: Arc<Catalog>, content: CachePartition, fetcher: Arc<F>, origin: String) -> Self {
        Self { catalog, content, fetcher, origin }
    }

    /// Decide how to serve one request.
    ///
    /// Returns `Ok(None)` when the request must pass through to the
    /// network untouched: non-GET methods, URLs outside the origin, and
    /// keys the catalog doesn't know. Otherwise returns the entry to
    /// serve, or the network error when no fallback exists.
    pub async fn intercept(&self, method: &str, url: &str) -> Result<Option<AssetEntry>, Error> {
        if !method.eq_ignore_ascii_case("GET") {
            return Ok(None);
        }
        let Some(key) = keys::request_key(&self.origin, url) else {
            return Ok(None);
        };
        if !self.catalog.contains(&key) {
            return Ok(None);
        }
        if key == ROOT_KEY {
            return self.online_first(&key).await.map(Some);
        }
        self.cache_first(&key).await.map(Some)
    }

    /// Serve from cache, falling back to a network fetch that lazily fills
    /// the cache on success. Non-success responses are returned uncached;
    /// a failed fetch with no cached entry propagates the failure.
    async fn cache_first(&self, key: &str) -> Result<AssetEntry, Error> {
        if let Some(entry) = self.content.get(key).await? {
            debug!(key, "cache hit");
            return Ok(entry);
        }

        debug!(key, "cache miss, fetching");
        let url = keys::resolve(&self.origin, key)?;
        let asset = self.fetcher.fetch(&url, false).await?;
        let entry = response::to_asset_entry(key, &asset);
        if asset.is_success() {
            self.content.put(&entry).await?;
        }
        Ok(entry)
    }

    /// Root document policy: network first, refreshing the cached copy on
    /// every reachable fetch; fall back to the cached entry only when the
    /// network fails, and propagate the original failure when there is no
    /// cached entry. Never fabricates a response.
    async fn online_first(&self, key: &str) -> Result<AssetEntry, Error> {
        let url = keys::resolve(&self.origin, key)?;
        match self.fetcher.fetch(&url, false).await {
            Ok(asset) => {
                let entry = response::to_asset_entry(key, &asset);
                self.content.put(&entry).await?;
                Ok(entry)
            }
            Err(err) => {
                if let Some(entry) = self.content.get(key).await? {
                    debug!("network failed, serving cached root document");
                    return Ok(entry);
                }
                Err(err)
            }
        }
    }
}
