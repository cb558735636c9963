//! Error types for the quarto-memory crate

use thiserror::Error;

/// Main error type for the quarto-memory crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("cannot decode {what} from '{input}': {reason}")]
    Decode {
        what: &'static str,
        input: String,
        reason: String,
    },

    #[error("invalid reward {reward} (expected 1.0, -1.0 or 0.0)")]
    InvalidReward { reward: f64 },

    #[error("dimension mismatch: {transform} expects {expected}, state has {got}")]
    DimensionMismatch {
        transform: &'static str,
        expected: String,
        got: String,
    },

    #[error("durable store unavailable during {operation}: {message}")]
    StoreUnavailable { operation: String, message: String },

    #[error("invalid state: {message}")]
    InvalidState { message: String },

    #[error("token {token} is out of range (game has {count} tokens)")]
    InvalidToken { token: usize, count: usize },

    #[error("cell ({row}, {col}) is outside the {side}x{side} board")]
    InvalidCell { row: usize, col: usize, side: usize },

    #[error("state '{state}' has no given token")]
    NoGivenToken { state: String },

    #[error("no value-mapping record for state '{state}'")]
    UnknownState { state: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("batch writer has shut down")]
    WriterClosed,
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a decode failure.
    pub(crate) fn decode(what: &'static str, input: &str, reason: impl Into<String>) -> Self {
        Error::Decode {
            what,
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from the durable store being unreachable.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
