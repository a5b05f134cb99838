//! Error types for layout resolution.
//!
//! This module defines all error types that can occur while resolving
//! detector output into a page layout.

/// Result type alias for layout resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout resolution.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Region with a degenerate rectangle or an unusable score
    #[error("Invalid region [{x1}, {y1}, {x2}, {y2}]: {reason}")]
    InvalidRegion {
        /// Left edge
        x1: f64,
        /// Top edge
        y1: f64,
        /// Right edge
        x2: f64,
        /// Bottom edge
        y2: f64,
        /// Why the region was rejected
        reason: String,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Detection model name not present in the model registry
    #[error("Unknown model name: {name}. Available: {available:?}")]
    UnknownModel {
        /// Requested model name
        name: String,
        /// Names that are available
        available: Vec<String>,
    },

    /// Label not part of the active model's label map
    #[error("Unknown label '{label}' for model '{model}'")]
    UnknownLabel {
        /// Model whose label map was consulted
        model: String,
        /// Offending label name or class id
        label: String,
    },

    /// Layout detector failed for a page
    #[error("Detection failed on page {page}: {reason}")]
    Detection {
        /// Zero-based page number
        page: usize,
        /// Reason reported by the detector
        reason: String,
    },

    /// Worker pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::InvalidRegion`] from corner coordinates.
    pub(crate) fn invalid_region(coords: [f64; 4], reason: impl Into<String>) -> Self {
        let [x1, y1, x2, y2] = coords;
        Error::InvalidRegion {
            x1,
            y1,
            x2,
            y2,
            reason: reason.into(),
        }
    }
}
