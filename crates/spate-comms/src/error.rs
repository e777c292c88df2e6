//! Transport and codec error types.

use std::error::Error;
use std::fmt;

use spate_core::WorkerRank;

/// A frame failed to decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The frame was shorter than its fixed or declared length.
    Truncated {
        /// Bytes required.
        expected: usize,
        /// Bytes actually present.
        got: usize,
    },
    /// The terminate flag byte was neither 0 nor 1.
    InvalidBool {
        /// The offending byte.
        byte: u8,
    },
    /// A payload frame's length prefix disagreed with its body.
    LengthMismatch {
        /// Length the prefix declared.
        declared: usize,
        /// Bytes that followed the prefix.
        got: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { expected, got } => {
                write!(f, "truncated frame: expected {expected} bytes, got {got}")
            }
            Self::InvalidBool { byte } => {
                write!(f, "invalid terminate flag byte {byte:#04x}")
            }
            Self::LengthMismatch { declared, got } => {
                write!(
                    f,
                    "payload length prefix declared {declared} bytes but frame carried {got}"
                )
            }
        }
    }
}

impl Error for CodecError {}

/// A transport-level failure between master and workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// A job was assigned to a worker that is already running one.
    SlotBusy {
        /// The double-booked worker.
        rank: WorkerRank,
    },
    /// The peer's channel end has been dropped.
    Disconnected {
        /// The unreachable worker, or `None` when the master side is gone.
        rank: Option<WorkerRank>,
    },
    /// A received frame failed to decode.
    Codec(CodecError),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotBusy { rank } => {
                write!(f, "worker {rank} already has a simulation in flight")
            }
            Self::Disconnected { rank: Some(rank) } => {
                write!(f, "worker {rank} disconnected")
            }
            Self::Disconnected { rank: None } => write!(f, "master disconnected"),
            Self::Codec(e) => write!(f, "codec failure: {e}"),
        }
    }
}

impl Error for ProtocolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for ProtocolError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}
