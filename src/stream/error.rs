//! Error types for the engine's file formats.
//!
//! Everything here is a setup error in the sense of the validation
//! pipeline: an input that cannot be opened or parsed stops the run
//! immediately. Content-level disagreements never surface as errors; they
//! become comparison results or empty analysis fields instead.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while locating, reading, or decoding one of the engine's
/// output files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StreamError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding failure (malformed row, type mismatch, ragged record).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding failure with the offending path attached.
    #[error("invalid JSON in {path}: {message}")]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying serde_json message.
        message: String,
    },

    /// A required input file or directory does not exist.
    #[error("missing input: {path}")]
    MissingInput {
        /// The expected path.
        path: PathBuf,
    },

    /// The CSV header is missing a required column. The delta format in
    /// particular must carry `instrument_id`; it is never defaulted.
    #[error("{path}: missing required column `{column}`")]
    MissingColumn {
        /// File whose header was incomplete.
        path: PathBuf,
        /// The absent column name.
        column: String,
    },

    /// A replay-index position was out of range.
    #[error("index {index} out of bounds for {len} distinct timestamps")]
    IndexOutOfBounds {
        /// Requested position.
        index: usize,
        /// Number of distinct timestamps in the index.
        len: usize,
    },
}
