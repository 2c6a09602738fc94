/*!
 * Error types for the cleansubs application.
 *
 * `CleanError` covers the failures of the cleaning engine itself (rule source,
 * entry ordering, output validation). `AppError` wraps it together with the
 * file and media-tool failures of the application layer.
 */

use thiserror::Error;

/// Errors raised by the cleaning engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CleanError {
    /// The rule source or configuration could not be read or used
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input entries are not sorted by start time
    #[error("Ordering error: entry {index} starts at {start_ms}ms, before the previous entry start {previous_start_ms}ms")]
    Ordering {
        /// 0-based position of the offending entry
        index: usize,
        /// Start of the offending entry
        start_ms: u64,
        /// Start of the entry preceding it
        previous_start_ms: u64,
    },

    /// A required field for a requested output is missing or invalid
    #[error("Validation error for '{field}': {message}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl CleanError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }
}

/// Errors from the external media tools (ffmpeg/ffprobe)
#[derive(Error, Debug)]
pub enum MediaError {
    /// The tool could not be started
    #[error("Failed to run {tool}: {message}")]
    SpawnFailed { tool: &'static str, message: String },

    /// The tool ran but reported failure
    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: &'static str, stderr: String },

    /// The tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: &'static str, secs: u64 },

    /// No usable subtitle track was found
    #[error("No subtitle track found: {0}")]
    NoSubtitleTrack(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the cleaning engine
    #[error(transparent)]
    Clean(#[from] CleanError),

    /// Error from a media tool
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
