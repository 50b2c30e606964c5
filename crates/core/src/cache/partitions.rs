//! Whole-entry CRUD over the named cache partitions.
//!
//! Every cached asset is one row; writes are whole-entry overwrites, so a
//! lazy-fill race between concurrent requests can duplicate a fetch but
//! never corrupt an entry.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use crate::Error;

/// One cached asset response: the body plus enough response metadata to
/// replay it to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Effective resource key the entry is stored under.
    pub key: String,
    /// Request URL the response was fetched from.
    pub url: String,
    /// HTTP status of the recorded response.
    pub status: u16,
    pub content_type: Option<String>,
    /// Response headers, serialized as a JSON object.
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl AssetEntry {
    /// Whether the recorded response status indicates success.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Handle to one named partition of the cache database.
///
/// Partitions are lightweight views over a shared `entries` table; clearing
/// one partition never touches the others.
#[derive(Clone, Debug)]
pub struct CachePartition {
    db: CacheDb,
    name: String,
}

impl CachePartition {
    pub(crate) fn new(db: CacheDb, name: &str) -> Self {
        Self { db, name: name.to_string() }
    }

    /// The partition's fixed logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or overwrite an entry. Writes are whole-entry upserts.
    pub async fn put(&self, entry: &AssetEntry) -> Result<(), Error> {
        let partition = self.name.clone();
        let entry = entry.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        partition, key, url, status, content_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition, key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        partition,
                        &entry.key,
                        &entry.url,
                        entry.status,
                        &entry.content_type,
                        &entry.headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key.
    ///
    /// Returns None if the key isn't present in this partition.
    pub async fn get(&self, key: &str) -> Result<Option<AssetEntry>, Error> {
        let partition = self.name.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<AssetEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, url, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE partition = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![partition, key], |row| {
                    Ok(AssetEntry {
                        key: row.get(0)?,
                        url: row.get(1)?,
                        status: row.get(2)?,
                        content_type: row.get(3)?,
                        headers_json: row.get(4)?,
                        body: row.get(5)?,
                        stored_at: row.get(6)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an entry by key. Returns whether a row was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, Error> {
        let partition = self.name.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted =
                    conn.execute("DELETE FROM entries WHERE partition = ?1 AND key = ?2", params![partition, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// All keys currently stored in this partition.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM entries WHERE partition = ?1 ORDER BY key")?;
                let keys = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// All entries currently stored in this partition.
    pub async fn entries(&self) -> Result<Vec<AssetEntry>, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<AssetEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, url, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE partition = ?1 ORDER BY key",
                )?;
                let entries = stmt
                    .query_map(params![partition], |row| {
                        Ok(AssetEntry {
                            key: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            content_type: row.get(3)?,
                            headers_json: row.get(4)?,
                            body: row.get(5)?,
                            stored_at: row.get(6)?,
                        })
                    })?
                    .collect::<Result<Vec<AssetEntry>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this partition.
    pub async fn len(&self) -> Result<u64, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether this partition holds no entries.
    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }

    /// Delete every entry in this partition. Returns the number deleted.
    ///
    /// This is the partition-deletion primitive: a cleared partition is
    /// indistinguishable from one that never existed.
    pub async fn clear(&self) -> Result<u64, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE partition = ?1", params![partition])?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
pub(crate) fn make_test_entry(key: &str, url: &str, body: &[u8]) -> AssetEntry {
    AssetEntry {
        key: key.to_string(),
        url: url.to_string(),
        status: 200,
        content_type: Some("application/octet-stream".to_string()),
        headers_json: None,
        body: body.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CONTENT_CACHE, STAGING_CACHE};

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let content = db.partition(CONTENT_CACHE);
        let entry = make_test_entry("main.js", "https://app.example.com/main.js", b"console.log(1)");

        content.put(&entry).await.unwrap();

        let retrieved = content.get("main.js").await.unwrap().unwrap();
        assert_eq!(retrieved, entry);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let content = db.partition(CONTENT_CACHE);
        assert!(content.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let content = db.partition(CONTENT_CACHE);

        content
            .put(&make_test_entry("main.js", "https://app.example.com/main.js", b"old"))
            .await
            .unwrap();
        content
            .put(&make_test_entry("main.js", "https://app.example.com/main.js", b"new"))
            .await
            .unwrap();

        let entry = content.get("main.js").await.unwrap().unwrap();
        assert_eq!(entry.body, b"new");
        assert_eq!(content.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let content = db.partition(CONTENT_CACHE);

        content
            .put(&make_test_entry("main.js", "https://app.example.com/main.js", b"x"))
            .await
            .unwrap();

        assert!(content.delete("main.js").await.unwrap());
        assert!(!content.delete("main.js").await.unwrap());
        assert!(content.get("main.js").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let content = db.partition(CONTENT_CACHE);
        let staging = db.partition(STAGING_CACHE);

        content
            .put(&make_test_entry("main.js", "https://app.example.com/main.js", b"content"))
            .await
            .unwrap();
        staging
            .put(&make_test_entry("main.js", "https://app.example.com/main.js", b"staged"))
            .await
            .unwrap();

        assert_eq!(content.get("main.js").await.unwrap().unwrap().body, b"content");
        assert_eq!(staging.get("main.js").await.unwrap().unwrap().body, b"staged");

        staging.clear().await.unwrap();
        assert!(staging.get("main.js").await.unwrap().is_none());
        assert!(content.get("main.js").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_keys_and_len() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let content = db.partition(CONTENT_CACHE);

        content
            .put(&make_test_entry("a.js", "https://app.example.com/a.js", b"a"))
            .await
            .unwrap();
        content
            .put(&make_test_entry("b.js", "https://app.example.com/b.js", b"b"))
            .await
            .unwrap();

        assert_eq!(content.keys().await.unwrap(), vec!["a.js", "b.js"]);
        assert_eq!(content.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_clear_reports_count() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let content = db.partition(CONTENT_CACHE);

        content
            .put(&make_test_entry("a.js", "https://app.example.com/a.js", b"a"))
            .await
            .unwrap();
        content
            .put(&make_test_entry("b.js", "https://app.example.com/b.js", b"b"))
            .await
            .unwrap();

        assert_eq!(content.clear().await.unwrap(), 2);
        assert_eq!(content.len().await.unwrap(), 0);
    }

    #[test]
    fn test_is_success() {
        let mut entry = make_test_entry("a", "https://app.example.com/a", b"");
        assert!(entry.is_success());
        entry.status = 404;
        assert!(!entry.is_success());
        entry.status = 299;
        assert!(entry.is_success());
    }
}
