//! Error types for pomodoro-core operations.
//!
//! Decode errors are always surfaced to the caller; a missing file is not an
//! error anywhere in this crate (read paths recover to empty/default values).

/// All errors that can occur in pomodoro-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────
    // Decode Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("malformed attribute {token:?} (expected key=value)")]
    MalformedAttribute { token: String },

    #[error("unknown duration unit in {value:?} (expected whole minutes)")]
    UnknownDurationUnit { value: String },

    #[error("invalid number for {key}: {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("expected a single session record, found {lines} lines")]
    MultipleRecords { lines: usize },

    // ─────────────────────────────────────────────────────────────────────
    // Environment / I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("home directory could not be determined")]
    HomeDirNotFound,

    #[error("i/o error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wraps an io error with a short operation context.
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns whether this is one of the decode-class errors.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::InvalidTimestamp { .. }
                | Error::MalformedAttribute { .. }
                | Error::UnknownDurationUnit { .. }
                | Error::InvalidNumber { .. }
                | Error::MultipleRecords { .. }
        )
    }
}

/// Convenience type alias for Results using pomodoro-core's Error.
pub type Result<T> = std::result::Result<T, Error>;
