use std::path::PathBuf;

use thiserror::Error;

/// Seeder error type.
/// Every variant is fatal: `main` logs it and exits with status 1.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read credential file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse credential file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid vibe catalog: {0}")]
    InvalidCatalog(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Commit rejected (status {status}): {message}")]
    CommitRejected { status: u16, message: String },

    /// The batch never reached the service.
    #[error("Commit failed: {0}")]
    Commit(String),

    /// The request was sent but no answer came back.
    #[error("Commit outcome unknown: {0}")]
    CommitIndeterminate(String),
}

impl SeedError {
    /// True when the batch is known not to have been applied.
    pub fn batch_not_applied(&self) -> bool {
        matches!(self, SeedError::Commit(_) | SeedError::CommitRejected { .. })
    }
}

