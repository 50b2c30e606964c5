//! Runtime command channel messages.
//!
//! The host sends fire-and-forget string messages. They parse into a
//! closed command set; unknown messages are rejected so typos surface in
//! the log instead of being silently dropped.

use std::str::FromStr;

/// Wire form of the immediate-activation request.
pub const SKIP_WAITING: &str = "skipWaiting";

/// Wire form of the bulk-prefetch trigger.
pub const DOWNLOAD_OFFLINE: &str = "downloadOffline";

/// Commands accepted on the worker's message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Activate a waiting worker generation immediately.
    ActivateNow,
    /// Fetch and cache every catalog resource not already cached.
    DownloadOffline,
}

/// A message that matches no known command.
#[derive(Debug, thiserror::Error)]
#[error("unknown message: {0:?}")]
pub struct UnknownMessage(String);

impl FromStr for Command {
    type Err = UnknownMessage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            SKIP_WAITING => Ok(Command::ActivateNow),
            DOWNLOAD_OFFLINE => Ok(Command::DownloadOffline),
            other => Err(UnknownMessage(other.to_string())),
        }
    }
}
