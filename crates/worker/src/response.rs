//! Conversion from fetched responses to cache entries.

use std::collections::BTreeMap;

use appshell_client::FetchedAsset;
use appshell_core::AssetEntry;

/// Build a whole-entry cache row from a fetched response.
///
/// Headers are flattened to a JSON object; non-UTF-8 header values are
/// dropped rather than mangled.
pub fn to_asset_entry(key: &str, asset: &FetchedAsset) -> AssetEntry {
    let headers: BTreeMap<&str, &str> = asset
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect();
    let headers_json = if headers.is_empty() { None } else { serde_json::to_string(&headers).ok() };

    AssetEntry {
        key: key.to_string(),
        url: asset.url.to_string(),
        status: asset.status.as_u16(),
        content_type: asset.content_type.clone(),
        headers_json,
        body: asset.bytes.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}
