//! # Error Types
//!
//! Custom error types for the KlimaLogg receiver using `thiserror`.
//!
//! Field-level problems inside a frame never show up here; the decoder
//! absorbs them into sentinel readings.

use thiserror::Error;

/// Main error type for the KlimaLogg receiver
#[derive(Debug, Error)]
pub enum KlimaLoggError {
    /// Frame shorter than the layout requires
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    /// Raw frame line is not valid hex
    #[error("Invalid hex frame: {0}")]
    InvalidHex(String),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No frame source could be opened
    #[error("Frame source not found: {0}")]
    SourceNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the KlimaLogg receiver
pub type Result<T> = std::result::Result<T, KlimaLoggError>;
