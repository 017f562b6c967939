use crate::assets::AssetError;
use crate::config::ValidationError;
use http::StatusCode;
use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Errors that can occur while serving beacon requests
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load assets: {0}")]
    Asset(#[from] AssetError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    #[error("Collector request failed: {0}")]
    CollectorRequest(#[from] reqwest::Error),

    #[error("Collector responded with {0}")]
    CollectorStatus(StatusCode),

    #[error("Internal error: {0}")]
    InternalError(String),
}
