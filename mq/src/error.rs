//! Error types for the mq CLI.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Clause(#[from] clauses::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown clause kind: {0}")]
    UnknownKind(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, Error>;
