use thiserror::Error;

/// Top-level error type for Planner.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Error from a tabular data source (spreadsheet read).
    #[error("source error: {0}")]
    Source(String),

    /// Error from a prose-generation provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a delivery channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Credential or token exchange error.
    #[error("auth error: {0}")]
    Auth(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
