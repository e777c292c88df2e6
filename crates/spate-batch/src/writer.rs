//! Result artifact serialization and writing.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use spate_core::{Simulation, SimulationId, WorkerRank};
use spate_solver::{CellState, Snapshot};

/// Writing a result artifact failed.
#[derive(Debug)]
pub enum ArtifactError {
    /// The artifact could not be written to disk.
    Io {
        /// The artifact path.
        path: PathBuf,
        /// The underlying filesystem error.
        source: std::io::Error,
    },
    /// The result document could not be encoded.
    Encode {
        /// Encoder message.
        reason: String,
    },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot write artifact {}: {source}", path.display())
            }
            Self::Encode { reason } => write!(f, "cannot encode result document: {reason}"),
        }
    }
}

impl Error for ArtifactError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode { .. } => None,
        }
    }
}

/// The self-describing JSON document a finished simulation produces.
///
/// Snapshot index 0 is the state after tick 0's perturbations but before
/// any solver step; index `ticks` is the final state, so there are
/// `ticks + 1` entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    /// The simulation's batch-assigned id.
    pub id: SimulationId,
    /// Enough of the config to interpret the snapshots without the
    /// batch file at hand.
    pub metadata: ResultMetadata,
    /// One cell list per captured tick, row-major over the bounded grid.
    pub snapshots: Vec<Vec<CellState>>,
}

/// Config echo embedded in every result document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Solver time step.
    pub time_step: f64,
    /// Number of solver steps taken.
    pub ticks: u64,
    /// Grid extents, interior and bounded.
    pub world: ResultWorld,
    /// Fluid constants the run used.
    pub fluid: ResultFluid,
}

/// Grid extents as recorded in an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultWorld {
    /// Interior width.
    pub width: u64,
    /// Interior height.
    pub height: u64,
    /// Width including boundary columns.
    pub width_bounds: u64,
    /// Height including boundary rows.
    pub height_bounds: u64,
}

/// Fluid constants as recorded in an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultFluid {
    /// Viscosity.
    pub viscosity: f64,
    /// Density added per source event.
    pub density: f64,
    /// Diffusion rate.
    pub diffusion: f64,
}

impl ResultDocument {
    /// Assemble a document from a finished run.
    pub fn new(id: SimulationId, sim: &Simulation, snapshots: &[Snapshot]) -> Self {
        Self {
            id,
            metadata: ResultMetadata {
                time_step: sim.time_step,
                ticks: sim.ticks,
                world: ResultWorld {
                    width: sim.world.width,
                    height: sim.world.height,
                    width_bounds: sim.world.width + 2,
                    height_bounds: sim.world.height + 2,
                },
                fluid: ResultFluid {
                    viscosity: sim.fluid.viscosity,
                    density: sim.fluid.density,
                    diffusion: sim.fluid.diffusion,
                },
            },
            snapshots: snapshots.iter().map(|s| s.cells().to_vec()).collect(),
        }
    }

    /// Encode the document as JSON bytes.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::Encode`] when serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        serde_json::to_vec(self).map_err(|e| ArtifactError::Encode {
            reason: e.to_string(),
        })
    }

    /// Decode a document from JSON bytes.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::Encode`] when the bytes are not a valid document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        serde_json::from_slice(bytes).map_err(|e| ArtifactError::Encode {
            reason: e.to_string(),
        })
    }
}

/// Writes result documents into an output directory, one file per
/// simulation.
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    /// Target the given directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::Io`] when the directory cannot be created.
    pub fn new(output_dir: &Path) -> Result<Self, ArtifactError> {
        fs::create_dir_all(output_dir).map_err(|source| ArtifactError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// The artifact path a given simulation and worker map to.
    pub fn artifact_path(&self, id: SimulationId, rank: WorkerRank) -> PathBuf {
        self.output_dir
            .join(format!("simulation-{id}-worker-{rank}.json"))
    }

    /// Write one result document, encoded, to its artifact path.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::Encode`] or [`ArtifactError::Io`].
    pub fn write(
        &self,
        rank: WorkerRank,
        document: &ResultDocument,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.artifact_path(document.id, rank);
        let bytes = document.to_bytes()?;
        fs::write(&path, bytes).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Write a document already encoded by the worker that produced it.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::Io`] when the file cannot be written.
    pub fn write_encoded(
        &self,
        id: SimulationId,
        rank: WorkerRank,
        bytes: &[u8],
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.artifact_path(id, rank);
        fs::write(&path, bytes).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
