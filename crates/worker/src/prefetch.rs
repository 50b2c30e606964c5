//! Bulk prefetch for explicit "download offline" requests.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use appshell_client::Fetcher;
use appshell_core::catalog::{Catalog, keys};
use appshell_core::{CachePartition, Error};

use crate::response;

/// Fills the content cache with every catalog resource not yet present.
pub struct Prefetcher<F> {
    catalog: Arc<Catalog>,
    content: CachePartition,
    fetcher: Arc<F>,
    origin: String,
}

impl<F: Fetcher> Prefetcher<F> {
    pub fn new(catalog: Arc<Catalog>, content: CachePartition, fetcher: Arc<F>, origin: String) -> Self {
        Self { catalog, content, fetcher, origin }
    }

    /// Fetch and store every catalog resource missing from the content
    /// cache. Returns the number of resources downloaded.
    ///
    /// Additive and idempotent: resources already cached are left
    /// untouched, and no fingerprint revalidation occurs. All-or-nothing:
    /// every missing resource is fetched before any is stored, so one
    /// failed download leaves the cache as it was.
    pub async fn download_offline(&self) -> Result<u64, Error> {
        let mut present = HashSet::new();
        for entry in self.content.entries().await? {
            if let Some(key) = keys::entry_key(&self.origin, &entry.url) {
                present.insert(key);
            }
        }

        let mut fetched = Vec::new();
        for key in self.catalog.keys() {
            if present.contains(key) {
                continue;
            }
            let url = keys::resolve(&self.origin, key)?;
            debug!(key, "prefetching");
            let asset = self.fetcher.fetch(&url, false).await?;
            if !asset.is_success() {
                return Err(Error::NetworkFetch(format!("{key}: status {}", asset.status.as_u16())));
            }
            fetched.push(response::to_asset_entry(key, &asset));
        }

        let count = fetched.len() as u64;
        for entry in &fetched {
            self.content.put(entry).await?;
        }

        info!(fetched = count, "offline download complete");
        Ok(count)
    }
}
