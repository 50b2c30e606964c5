//! Core types and shared functionality for appshell.
//!
//! This crate provides:
//! - The build-time resource catalog and effective-key normalization
//! - SQLite-backed cache partitions and the manifest store
//! - The activation-time reconciliation engine
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;

pub use cache::{AssetEntry, CacheDb, CachePartition};
pub use catalog::Catalog;
pub use config::AppConfig;
pub use error::Error;
