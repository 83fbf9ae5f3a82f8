//! Extraction error taxonomy.
//!
//! Unrecoverable failures (no tooling, malformed analyzer output, timeout,
//! cancellation) surface here. Recoverable conditions - a single file that
//! failed to parse, analyzer stderr chatter, truncated-but-parseable output -
//! are carried as diagnostics or warnings on the result instead.

use thiserror::Error;

use crate::model::Language;

/// Error raised by an extractor's public entry point.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The per-language analyzer could not be started at all.
    #[error("{language} extractor unavailable: {reason}")]
    Unavailable { language: Language, reason: String },

    /// The analyzer process ran and reported failure.
    #[error("{language} analyzer failed: {message}")]
    AnalyzerFailed { language: Language, message: String },

    /// The analyzer process exceeded its deadline and was terminated.
    #[error("{language} analyzer timed out after {seconds}s")]
    Timeout { language: Language, seconds: u64 },

    /// The analyzer produced JSON we could not deserialize into the raw shape.
    #[error("{language} analyzer output malformed: {message}")]
    Malformed { language: Language, message: String },

    /// Caller-initiated cancellation. Never downgraded to a result.
    #[error("extraction cancelled")]
    Cancelled,

    /// Filesystem trouble outside a single source file (those become diagnostics).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// True when retrying without installing anything cannot help.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ExtractError::Unavailable { .. })
    }
}
