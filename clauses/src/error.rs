//! Error types for clause construction and compilation.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed clause text. Fatal for that clause only. `input` is kept for
    /// callers but stays out of the message, which may end up in logs.
    #[error("Unable to parse {clause} clause")]
    Parse { clause: &'static str, input: String },

    /// The caller handed over a value the compiler must never see.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown built-in query: {0}")]
    UnknownBuiltIn(String),

    #[error("No such folder")]
    NoSuchFolder,
}

impl Error {
    /// Shorthand for a parse failure on a clause kind.
    pub fn parse(clause: &'static str, input: impl Into<String>) -> Self {
        Error::Parse {
            clause,
            input: input.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
