//! Worker lifecycle: install-time staging and activation.
//!
//! Install and activate are sequential phases. Install stages the core
//! shell into the staging cache and marks the worker eligible for
//! immediate activation (skip-waiting). Activate runs reconciliation and
//! claims clients; if reconciliation fails, the whole cache state is
//! purged and the worker degrades to pass-through until the next
//! successful activation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use appshell_client::Fetcher;
use appshell_core::cache::reconcile::{purge_all, reconcile};
use appshell_core::cache::{CONTENT_CACHE, STAGING_CACHE};
use appshell_core::catalog::{Catalog, keys};
use appshell_core::{CacheDb, Error};

use crate::interceptor::Interceptor;
use crate::messages::Command;
use crate::prefetch::Prefetcher;
use crate::response;

/// Lifecycle phase of one worker generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, not yet installed.
    Idle,
    /// Core shell staged; eligible for immediate activation.
    Installed,
    /// Reconciled and controlling clients.
    Active,
    /// Reconciliation failed and the cache was purged; every request
    /// falls through to the network until the next activation.
    Degraded,
}

/// One worker generation: owns the cache handles and drives the
/// install/activate sequence and runtime commands.
pub struct Worker<F> {
    db: CacheDb,
    catalog: Arc<Catalog>,
    fetcher: Arc<F>,
    origin: String,
    phase: Phase,
}

impl<F: Fetcher> Worker<F> {
    pub fn new(db: CacheDb, catalog: Arc<Catalog>, fetcher: Arc<F>, origin: String) -> Self {
        Self { db, catalog, fetcher, origin, phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Request-time policy bound to this worker's content cache.
    pub fn interceptor(&self) -> Interceptor<F> {
        Interceptor::new(
            self.catalog.clone(),
            self.db.partition(CONTENT_CACHE),
            self.fetcher.clone(),
            self.origin.clone(),
        )
    }

    fn prefetcher(&self) -> Prefetcher<F> {
        Prefetcher::new(
            self.catalog.clone(),
            self.db.partition(CONTENT_CACHE),
            self.fetcher.clone(),
            self.origin.clone(),
        )
    }

    /// Stage every core-shell resource into the staging cache, bypassing
    /// intermediary HTTP caches.
    ///
    /// Any fetch failure fails the install; retry belongs to the host's
    /// own install retry policy, not this subsystem. A failed install may
    /// leave entries in staging; they are never promoted, and the next
    /// attempt restages every core resource.
    pub async fn install(&mut self) -> Result<(), Error> {
        let staging = self.db.partition(STAGING_CACHE);

        for key in &self.catalog.core {
            let url = keys::resolve(&self.origin, key)?;
            let asset = self
                .fetcher
                .fetch(&url, true)
                .await
                .map_err(|e| Error::StagingFetch(format!("{key}: {e}")))?;
            if !asset.is_success() {
                return Err(Error::StagingFetch(format!("{key}: status {}", asset.status.as_u16())));
            }
            staging.put(&response::to_asset_entry(key, &asset)).await?;
        }

        self.phase = Phase::Installed;
        info!(staged = self.catalog.core.len(), "core shell staged, skipping wait");
        Ok(())
    }

    /// Reconcile the content cache against the current catalog, then claim
    /// clients.
    ///
    /// A reconciliation failure is absorbed: the cache state is purged,
    /// the worker degrades to pass-through, and `Ok` is returned so the
    /// generation keeps serving. Only a failure of the purge itself is an
    /// error.
    pub async fn activate(&mut self) -> Result<(), Error> {
        match reconcile(&self.db, &self.catalog, &self.origin).await {
            Ok(()) => {
                self.phase = Phase::Active;
                info!("worker active, claiming clients");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "reconciliation failed, purging cache state");
                purge_all(&self.db).await?;
                self.phase = Phase::Degraded;
                Ok(())
            }
        }
    }

    /// Dispatch one runtime command from the message channel.
    pub async fn handle(&mut self, command: Command) -> Result<(), Error> {
        match command {
            Command::ActivateNow => {
                if self.phase == Phase::Installed {
                    self.activate().await
                } else {
                    debug!(phase = ?self.phase, "skipWaiting is a no-op in this phase");
                    Ok(())
                }
            }
            Command::DownloadOffline => {
                if matches!(self.phase, Phase::Active | Phase::Degraded) {
                    self.prefetcher().download_offline().await.map(|_| ())
                } else {
                    warn!(phase = ?self.phase, "downloadOffline before activation, ignoring");
                    Ok(())
                }
            }
        }
    }
}
