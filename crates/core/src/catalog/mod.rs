//! Build-time resource catalog.
//!
//! The catalog is the single process-wide resource list: a mapping from
//! logical resource key to content fingerprint, plus the core-shell subset
//! that must be downloaded before the application can start. It is embedded
//! at build time and immutable for the lifetime of one worker version.

pub mod keys;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;

/// The root sentinel key: the canonical key for the application's entry
/// document regardless of which aliasing form was requested.
pub const ROOT_KEY: &str = "/";

/// Immutable mapping of resource key to content fingerprint, with the
/// core-shell subset fetched eagerly at install time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Resource key -> content fingerprint.
    pub resources: BTreeMap<String, String>,

    /// Core-shell keys, in download order. Must be a subset of `resources`.
    #[serde(default)]
    pub core: Vec<String>,
}

impl Catalog {
    /// Decode a catalog from its build-time JSON literal and validate it.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let catalog: Self = serde_json::from_str(json).map_err(|e| Error::Catalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the core-set invariant: every core-shell key must appear in
    /// the resource map.
    pub fn validate(&self) -> Result<(), Error> {
        for key in &self.core {
            if !self.resources.contains_key(key) {
                return Err(Error::Catalog(format!("core-shell key not in resources: {key}")));
            }
        }
        Ok(())
    }

    /// Whether the catalog knows the given resource key.
    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    /// The fingerprint recorded for a key, if any.
    pub fn fingerprint_of(&self, key: &str) -> Option<&str> {
        self.resources.get(key).map(String::as_str)
    }

    /// All resource keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }
}

/// Compute the content fingerprint for an asset body (SHA-256, hex).
///
/// The worker treats fingerprints as opaque; this helper exists for build
/// tooling that regenerates the catalog and for tests.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_json(
            r#"{
                "resources": {
                    "/": "aaa1",
                    "index.html": "aaa1",
                    "main.js": "bbb2",
                    "assets/logo.png": "ccc3"
                },
                "core": ["main.js", "index.html"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_json() {
        let catalog = sample();
        assert_eq!(catalog.resources.len(), 4);
        assert_eq!(catalog.core, vec!["main.js", "index.html"]);
    }

    #[test]
    fn test_core_must_be_subset() {
        let result = Catalog::from_json(r#"{"resources": {"a": "1"}, "core": ["missing"]}"#);
        assert!(matches!(result, Err(Error::Catalog(_))));
    }

    #[test]
    fn test_core_defaults_empty() {
        let catalog = Catalog::from_json(r#"{"resources": {"a": "1"}}"#).unwrap();
        assert!(catalog.core.is_empty());
    }

    #[test]
    fn test_lookup() {
        let catalog = sample();
        assert!(catalog.contains(ROOT_KEY));
        assert_eq!(catalog.fingerprint_of("main.js"), Some("bbb2"));
        assert_eq!(catalog.fingerprint_of("missing.js"), None);
    }

    #[test]
    fn test_fingerprint_stability() {
        assert_eq!(fingerprint(b"body"), fingerprint(b"body"));
        assert_ne!(fingerprint(b"body"), fingerprint(b"other"));
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(b"body");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
