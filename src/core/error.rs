use std::time::Duration;

use thiserror::Error;

use super::model::PlayerId;

/// Errors from preference storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No stored preferences for {0}")]
    NotFound(PlayerId),

    #[error("Storage did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Storage task failed: {0}")]
    TaskFailed(String),
}

/// Errors surfaced to the command layer when a player changes a setting.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("unknown sound '{0}'")]
    InvalidSound(String),
}

/// Errors reported by host channel sends.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("player {0} is not reachable")]
    Unavailable(PlayerId),

    #[error("send failed: {0}")]
    Failed(String),
}
