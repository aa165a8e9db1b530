// src/utils/errors.rs
//! Error types for the recorder
//!
//! The hot path has no error taxonomy at all: slot allocation cannot fail,
//! calibration only degrades under scheduling noise, and event recording is
//! fire-and-forget. The fallible edges are the sink and the drain thread
//! itself, both surfaced at shutdown.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, TraceError>;

/// Recorder errors
#[derive(Debug, Error)]
pub enum TraceError {
    /// The sink rejected a write during a drain pass
    #[error("sink write failed: {0}")]
    SinkFailed(String),

    /// The drain thread could not be started or exited abnormally
    #[error("drain thread failed: {0}")]
    DrainFailed(String),
}
