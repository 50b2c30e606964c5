//! Manifest persistence for differential reconciliation.
//!
//! The manifest store holds exactly one entry, keyed `"manifest"`, whose
//! body is the JSON-serialized resource map of the previously-active
//! catalog. Its absence signals a first-run or forced-reset condition.

use std::collections::BTreeMap;

use super::MANIFEST_STORE;
use super::connection::CacheDb;
use crate::Error;
use crate::cache::partitions::AssetEntry;

/// Resource key -> fingerprint, as persisted across activations.
pub type ManifestMap = BTreeMap<String, String>;

/// The single key the manifest is stored under.
const MANIFEST_KEY: &str = "manifest";

impl CacheDb {
    /// Read the manifest persisted by the previous activation.
    ///
    /// Returns None when no manifest has ever been saved (or the store was
    /// purged). A present-but-undecodable manifest is an error, not None:
    /// reconciliation must not silently treat corruption as a first run.
    pub async fn load_manifest(&self) -> Result<Option<ManifestMap>, Error> {
        let entry = self.partition(MANIFEST_STORE).get(MANIFEST_KEY).await?;
        match entry {
            None => Ok(None),
            Some(entry) => {
                let map = serde_json::from_slice(&entry.body).map_err(|e| Error::Manifest(e.to_string()))?;
                Ok(Some(map))
            }
        }
    }

    /// Persist the given resource map as the new manifest, replacing any
    /// previous one.
    pub async fn save_manifest(&self, resources: &ManifestMap) -> Result<(), Error> {
        let body = serde_json::to_vec(resources).map_err(|e| Error::Manifest(e.to_string()))?;
        let entry = AssetEntry {
            key: MANIFEST_KEY.to_string(),
            url: String::new(),
            status: 200,
            content_type: Some("application/json".to_string()),
            headers_json: None,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        };
        self.partition(MANIFEST_STORE).put(&entry).await
    }
}
