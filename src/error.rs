use thiserror::Error;

use crate::db::StoreError;
use crate::notifier::NotifyError;
use crate::riot::RiotApiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Riot API error: {0}")]
    RiotApi(#[from] RiotApiError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Multiplier must be positive, got {0}")]
    InvalidMultiplier(f64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
