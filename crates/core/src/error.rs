//! Unified error types for appshell.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by every appshell crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A core-shell resource could not be fetched during install.
    #[error("staging fetch failed: {0}")]
    StagingFetch(String),

    /// The activation-time diff/promote/persist sequence failed.
    #[error("reconciliation failed: {0}")]
    Reconciliation(String),

    /// A network fetch failed at request time.
    #[error("network fetch failed: {0}")]
    NetworkFetch(String),

    /// A fetched body exceeded the configured size cap.
    #[error("fetched body too large: {0}")]
    FetchTooLarge(String),

    /// Database operation failed.
    #[error("cache store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// The persisted manifest could not be encoded or decoded.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// The build-time catalog could not be decoded or failed validation.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The configured origin is unusable, or a key cannot be resolved
    /// against it.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
