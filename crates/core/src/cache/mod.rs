//! SQLite-backed cache partitions for offline assets.
//!
//! This module provides the persistent store behind the worker, using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Three fixed named partitions over one whole-entry table
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - A single-row manifest store for differential reconciliation
//! - The activation-time reconciliation engine

pub mod connection;
pub mod manifest;
pub mod migrations;
pub mod partitions;
pub mod reconcile;

pub use crate::Error;

pub use connection::CacheDb;
pub use manifest::ManifestMap;
pub use partitions::{AssetEntry, CachePartition};

/// Durable store of reconciled assets served at runtime.
pub const CONTENT_CACHE: &str = "appshell-content";

/// Transient store for freshly fetched core-shell assets, promoted into the
/// content cache at activation.
pub const STAGING_CACHE: &str = "appshell-staging";

/// Holds the serialized catalog from the previous activation.
pub const MANIFEST_STORE: &str = "appshell-manifest";
