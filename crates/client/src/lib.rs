//! Client code for appshell.
//!
//! This crate provides the HTTP fetch pipeline the worker uses for
//! install-time staging, request-time lazy fill, and bulk prefetch.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchedAsset, Fetcher};
