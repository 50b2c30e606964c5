//! Activation-time reconciliation of the content cache.
//!
//! Diffs the previously persisted manifest against the current catalog,
//! evicts stale or removed entries, promotes staged core-shell entries, and
//! persists the new manifest. Runs exactly once per activation; the host
//! guarantees activations never overlap.

use tracing::{debug, info};

use super::connection::CacheDb;
use super::partitions::CachePartition;
use super::{CONTENT_CACHE, MANIFEST_STORE, STAGING_CACHE};
use crate::Error;
use crate::catalog::{Catalog, keys};

/// Run the reconciliation sequence against the current catalog.
///
/// With no prior manifest the content cache is rebuilt from staging alone
/// (full bootstrap, no partial reuse). With a prior manifest, content
/// entries are kept only when their key is still in the catalog and its
/// fingerprint is unchanged since the previous activation; staged entries
/// then overwrite any same-key survivors.
///
/// On any `Err` the caller must assume the cache state is unusable and
/// purge it via [`purge_all`].
pub async fn reconcile(db: &CacheDb, catalog: &Catalog, origin: &str) -> Result<(), Error> {
    let content = db.partition(CONTENT_CACHE);
    let staging = db.partition(STAGING_CACHE);

    let Some(old_manifest) = db.load_manifest().await? else {
        // First install or forced reset: no partial reuse.
        content.clear().await?;
        let promoted = promote_staged(&staging, &content).await?;
        staging.clear().await?;
        db.save_manifest(&catalog.resources).await?;
        info!(promoted, "content cache bootstrapped from staging");
        return Ok(());
    };

    let mut evicted = 0u64;
    for entry in content.entries().await? {
        // Keep only entries whose key survived into the current catalog
        // with an unchanged fingerprint; everything else is re-downloaded.
        let stale = match keys::entry_key(origin, &entry.url) {
            None => true,
            Some(key) => match catalog.fingerprint_of(&key) {
                None => true,
                Some(current) => old_manifest.get(&key).map(String::as_str) != Some(current),
            },
        };
        if stale {
            debug!(key = %entry.key, "evicting stale entry");
            content.delete(&entry.key).await?;
            evicted += 1;
        }
    }

    // Core-shell files always win over retained entries.
    let promoted = promote_staged(&staging, &content).await?;
    staging.clear().await?;
    db.save_manifest(&catalog.resources).await?;

    info!(evicted, promoted, "content cache reconciled");
    Ok(())
}

/// Copy every staging entry into the content cache, overwriting same-key
/// entries. Returns the number promoted.
async fn promote_staged(staging: &CachePartition, content: &CachePartition) -> Result<u64, Error> {
    let mut promoted = 0u64;
    for entry in staging.entries().await? {
        content.put(&entry).await?;
        promoted += 1;
    }
    Ok(promoted)
}

/// Delete the content cache, the staging cache, and the manifest store
/// unconditionally.
///
/// Invoked when reconciliation fails part-way: a partially reconciled cache
/// is never left in place, and the worker degrades to pass-through until
/// the next successful activation.
pub async fn purge_all(db: &CacheDb) -> Result<(), Error> {
    for name in [CONTENT_CACHE, STAGING_CACHE, MANIFEST_STORE] {
        db.partition(name).clear().await?;
    }
    Ok(())
}
