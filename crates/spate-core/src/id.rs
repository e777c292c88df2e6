//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one simulation within a batch.
///
/// IDs are assigned by the batch loader in submission order, starting at
/// zero, and travel with the job across the control channel and into the
/// result artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(pub u64);

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SimulationId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies one worker participant.
///
/// Rank 0 is reserved for the dispatcher (master); workers occupy ranks
/// `1..=worker_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerRank(pub u32);

impl WorkerRank {
    /// The dispatcher's rank.
    pub const MASTER: WorkerRank = WorkerRank(0);
}

impl fmt::Display for WorkerRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WorkerRank {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
