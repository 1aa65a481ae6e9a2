//! Error taxonomy shared across winmedic crates.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type MedicResult<T> = Result<T, MedicError>;

/// Errors surfaced by the session engine and its collaborators.
#[derive(Debug, Error)]
pub enum MedicError {
    /// The process lacks the elevation the maintenance operations require.
    /// Fatal, and only raised before the menu loop starts.
    #[error("{0}")]
    Privilege(String),

    /// The configuration file is missing required values or contains
    /// contradictory ones.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catalog registration failed at startup (duplicate selector).
    #[error("catalog registration error: {0}")]
    Catalog(String),

    /// An external maintenance capability reported or raised an error.
    #[error("{0}")]
    Provider(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
