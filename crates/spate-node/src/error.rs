//! The run-level error type.

use std::error::Error;
use std::fmt;

use spate_batch::ArtifactError;
use spate_comms::ProtocolError;
use spate_core::{ConfigError, WorkerRank};

/// Anything that can abort a batch run.
#[derive(Debug)]
pub enum RunError {
    /// The batch file or run configuration was invalid.
    Config(ConfigError),
    /// Master/worker communication broke down.
    Protocol(ProtocolError),
    /// A result artifact could not be produced.
    Artifact(ArtifactError),
    /// A worker thread panicked instead of reporting back.
    WorkerPanicked {
        /// The dead worker.
        rank: WorkerRank,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::Artifact(e) => write!(f, "artifact error: {e}"),
            Self::WorkerPanicked { rank } => write!(f, "worker {rank} panicked"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Artifact(e) => Some(e),
            Self::WorkerPanicked { .. } => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ProtocolError> for RunError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<ArtifactError> for RunError {
    fn from(e: ArtifactError) -> Self {
        Self::Artifact(e)
    }
}
