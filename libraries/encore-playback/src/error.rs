//! Error types for playback management

use std::time::Duration;
use thiserror::Error;

/// Playback errors
///
/// Queue and transport commands never return these: invalid indices are
/// no-ops and widget commands issued before readiness are dropped with a
/// warning. Only the IO-facing surfaces (readiness wait, configuration,
/// catalog, file storage) are fallible.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No widget has been attached to the transport controller
    #[error("No video widget attached")]
    WidgetNotAttached,

    /// Widget did not report readiness in time
    #[error("Video widget not ready after {0:?}")]
    ReadinessTimeout(Duration),

    /// Durable storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Stored state could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog service error
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage refused the write (quota, read-only medium)
    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    /// Storage backend is not available on this device
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
