//! Error types shared across the Spate crates, organized by failure class:
//! configuration errors abort the whole run; spatial errors are the only
//! locally recoverable class (the caller logs and continues).

use std::error::Error;
use std::fmt;

/// Errors in batch or simulation configuration data.
///
/// All of these are detected eagerly — at parse time or at solver
/// construction — and abort the entire run. There is no retry or partial
/// execution path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The batch or simulation document is not valid JSON for the schema.
    Parse {
        /// Human-readable description from the decoder.
        reason: String,
    },
    /// A simulation record could not be serialized for the payload channel.
    Serialize {
        /// Human-readable description from the encoder.
        reason: String,
    },
    /// A parsed field has an out-of-domain value (non-positive dimension,
    /// non-finite constant, zero tick count).
    InvalidField {
        /// Schema path of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { reason } => write!(f, "batch parse failed: {reason}"),
            Self::Serialize { reason } => write!(f, "simulation serialize failed: {reason}"),
            Self::InvalidField { field, reason } => {
                write!(f, "invalid field `{field}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Spatial or range errors from solver perturbation calls.
///
/// The only locally recoverable error class: the failing call mutates no
/// state, the caller logs the rejection and continues with the run.
#[derive(Clone, Debug, PartialEq)]
pub enum SpatialError {
    /// Coordinates outside the interior `[0, width) × [0, height)`.
    OutOfBounds {
        /// Requested x coordinate (interior, 0-based).
        x: u64,
        /// Requested y coordinate (interior, 0-based).
        y: u64,
        /// Interior width of the grid.
        width: u64,
        /// Interior height of the grid.
        height: u64,
    },
    /// A force component exceeds the fixed velocity cap in magnitude.
    ForceTooStrong {
        /// Supplied horizontal component.
        vx: f64,
        /// Supplied vertical component.
        vy: f64,
        /// The cap that was exceeded.
        cap: f64,
    },
}

impl fmt::Display for SpatialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "coordinates ({x}, {y}) outside interior {width}x{height}"
            ),
            Self::ForceTooStrong { vx, vy, cap } => {
                write!(f, "force ({vx}, {vy}) exceeds velocity cap {cap}")
            }
        }
    }
}

impl Error for SpatialError {}
