//! Error types for OmniGen runs.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop or degrade a generation run.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Low disk space! Only {available_mb:.2}MB available ({required_mb}MB required)")]
    ResourceExhausted { available_mb: f64, required_mb: u64 },

    #[error("Unable to read free disk space: {0}")]
    SpaceProbe(#[source] io::Error),

    #[error("Failed to open {sink} sink at {}: {source}", .path.display())]
    SinkOpen {
        sink: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Write to {sink} sink failed: {source}")]
    SinkWrite {
        sink: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Finalizing {sink} sink failed: {source}")]
    SinkFinalize {
        sink: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to install termination handler: {0}")]
    Signal(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;

impl GenError {
    /// Process exit status for this error.
    ///
    /// Resource problems get `1`, configuration problems `2` (the same status
    /// clap uses for usage errors), and storage failures on the outputs `3`.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenError::ResourceExhausted { .. } | GenError::SpaceProbe(_) => 1,
            GenError::InvalidConfiguration(_) => 2,
            GenError::SinkOpen { .. }
            | GenError::SinkWrite { .. }
            | GenError::SinkFinalize { .. }
            | GenError::Signal(_)
            | GenError::Io(_) => 3,
        }
    }
}
