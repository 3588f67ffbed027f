//! CLI error types.

use std::path::PathBuf;

use wpi_config::ConfigError;
use wpi_store::StoreError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to seed store from {}: {source}", path.display())]
    Seed { path: PathBuf, source: StoreError },

    #[error("{0}")]
    Validation(String),
}
