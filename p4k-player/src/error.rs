//! Error types for p4k-player
//!
//! Only startup and load failures are ever returned to callers. Missing
//! shaders and failed status reads are degraded in place (logged, reported,
//! zero-value sentinels) and never abort an operation.

use crate::engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for p4k-player
#[derive(Error, Debug)]
pub enum Error {
    /// Engine could not be constructed or configured (fatal at startup)
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// Engine rejected a source; playback state is unchanged
    #[error("Failed to load {target}: {reason}")]
    Load {
        target: String,
        #[source]
        reason: EngineError,
    },

    /// Optional shader or script not present
    #[error("Resource missing: {}", .0.display())]
    ResourceMissing(PathBuf),

    /// Status read failed
    #[error("Query failed for {property}: {reason}")]
    QueryFailure {
        property: &'static str,
        #[source]
        reason: EngineError,
    },

    /// External subtitle rejected; playback continues
    #[error("Failed to load subtitle {path}: {reason}")]
    Subtitle {
        path: String,
        #[source]
        reason: EngineError,
    },

    /// Any other engine failure
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using p4k-player Error
pub type Result<T> = std::result::Result<T, Error>;
