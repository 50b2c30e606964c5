//! Effective-key normalization for request and entry URLs.
//!
//! Aliasing rules:
//! - The origin itself, the trailing-slash root, and hash-fragment
//!   navigations (`origin/#...`) all map to the root sentinel key.
//! - A recognized cache-busting `?v=` query suffix is stripped before
//!   lookup, so `main.js?v=123` and `main.js` share one cache entry.

use url::Url;

use crate::Error;
use crate::catalog::ROOT_KEY;

/// Cache-busting query marker recognized on asset requests.
const VERSION_MARKER: &str = "?v=";

/// Derive the effective resource key for an incoming request URL.
///
/// Returns `None` when the URL is outside the given origin; such requests
/// are never intercepted.
pub fn request_key(origin: &str, url: &str) -> Option<String> {
    let origin = origin.trim_end_matches('/');
    if url == origin {
        return Some(ROOT_KEY.to_string());
    }
    let rest = url.strip_prefix(origin)?.strip_prefix('/')?;

    let key = match rest.split_once(VERSION_MARKER) {
        Some((path, _)) => path,
        None => rest,
    };

    if key.is_empty() || key.starts_with('#') {
        return Some(ROOT_KEY.to_string());
    }
    Some(key.to_string())
}

/// Derive the effective key for a stored cache entry from its recorded
/// request URL. The root path maps to the root sentinel; no cache-buster
/// stripping happens here because stored URLs were normalized on insert.
pub fn entry_key(origin: &str, url: &str) -> Option<String> {
    let origin = origin.trim_end_matches('/');
    if url == origin {
        return Some(ROOT_KEY.to_string());
    }
    let rest = url.strip_prefix(origin)?.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(ROOT_KEY.to_string());
    }
    Some(rest.to_string())
}

/// Resolve a resource key to an absolute URL under the given origin.
pub fn resolve(origin: &str, key: &str) -> Result<Url, Error> {
    let base = Url::parse(origin).map_err(|e| Error::InvalidOrigin(format!("{origin}: {e}")))?;
    match base.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidOrigin(format!("unsupported scheme: {scheme}"))),
    }
    let target = if key == ROOT_KEY { "/" } else { key };
    base.join(target).map_err(|e| Error::InvalidOrigin(format!("{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://app.example.com";

    #[test]
    fn test_request_key_plain_asset() {
        assert_eq!(request_key(ORIGIN, "https://app.example.com/main.js").as_deref(), Some("main.js"));
    }

    #[test]
    fn test_request_key_nested_asset() {
        assert_eq!(
            request_key(ORIGIN, "https://app.example.com/assets/logo.png").as_deref(),
            Some("assets/logo.png")
        );
    }

    #[test]
    fn test_request_key_strips_version_param() {
        assert_eq!(request_key(ORIGIN, "https://app.example.com/main.js?v=123").as_deref(), Some("main.js"));
    }

    #[test]
    fn test_root_aliasing() {
        // Origin, trailing-slash root, and hash routes resolve to one key.
        assert_eq!(request_key(ORIGIN, "https://app.example.com").as_deref(), Some(ROOT_KEY));
        assert_eq!(request_key(ORIGIN, "https://app.example.com/").as_deref(), Some(ROOT_KEY));
        assert_eq!(request_key(ORIGIN, "https://app.example.com/#/any-route").as_deref(), Some(ROOT_KEY));
    }

    #[test]
    fn test_root_key_distinct_from_document_alias() {
        assert_eq!(request_key(ORIGIN, "https://app.example.com/index.html").as_deref(), Some("index.html"));
    }

    #[test]
    fn test_request_key_foreign_origin() {
        assert_eq!(request_key(ORIGIN, "https://other.example.com/main.js"), None);
    }

    #[test]
    fn test_request_key_trailing_slash_origin() {
        assert_eq!(request_key("https://app.example.com/", "https://app.example.com/main.js").as_deref(), Some("main.js"));
    }

    #[test]
    fn test_entry_key_root() {
        assert_eq!(entry_key(ORIGIN, "https://app.example.com/").as_deref(), Some(ROOT_KEY));
        assert_eq!(entry_key(ORIGIN, "https://app.example.com").as_deref(), Some(ROOT_KEY));
    }

    #[test]
    fn test_entry_key_asset() {
        assert_eq!(entry_key(ORIGIN, "https://app.example.com/styles.css").as_deref(), Some("styles.css"));
    }

    #[test]
    fn test_resolve_key() {
        let url = resolve(ORIGIN, "assets/logo.png").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/assets/logo.png");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(ORIGIN, ROOT_KEY).unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/");
    }

    #[test]
    fn test_resolve_bad_origin() {
        assert!(matches!(resolve("not a url", "main.js"), Err(Error::InvalidOrigin(_))));
        assert!(matches!(resolve("file:///tmp", "main.js"), Err(Error::InvalidOrigin(_))));
    }

    #[test]
    fn test_resolve_round_trips_with_entry_key() {
        let url = resolve(ORIGIN, "main.js").unwrap();
        assert_eq!(entry_key(ORIGIN, url.as_str()).as_deref(), Some("main.js"));
    }
}
