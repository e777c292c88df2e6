//! Batch file parsing and per-simulation config serialization.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use spate_core::{Batch, ConfigError, Simulation, SimulationId};

/// Parse a batch document and validate every simulation in it.
///
/// Ids are assigned by position in the file, starting at 0, and the
/// returned map preserves that order.
///
/// # Errors
///
/// [`ConfigError::Parse`] for malformed JSON and
/// [`ConfigError::InvalidField`] for the first simulation that fails
/// validation; a batch with any bad entry is rejected whole.
pub fn parse_batch(text: &str) -> Result<IndexMap<SimulationId, Simulation>, ConfigError> {
    let batch: Batch = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })?;

    let mut simulations = IndexMap::with_capacity(batch.simulations.len());
    for (position, sim) in batch.simulations.into_iter().enumerate() {
        sim.validate()?;
        simulations.insert(SimulationId(position as u64), sim);
    }
    Ok(simulations)
}

/// Read and parse a batch file from disk.
///
/// # Errors
///
/// [`ConfigError::Parse`] for unreadable files, plus everything
/// [`parse_batch`] rejects.
pub fn load_batch(path: &Path) -> Result<IndexMap<SimulationId, Simulation>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    parse_batch(&text)
}

/// Parse a single simulation config, as shipped to a worker.
///
/// # Errors
///
/// [`ConfigError::Parse`] for malformed JSON and
/// [`ConfigError::InvalidField`] for invalid values.
pub fn parse_simulation(bytes: &[u8]) -> Result<Simulation, ConfigError> {
    let sim: Simulation = serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })?;
    sim.validate()?;
    Ok(sim)
}

/// Serialize one simulation config for shipping to a worker.
///
/// # Errors
///
/// [`ConfigError::Serialize`] when encoding fails.
pub fn serialize_simulation(sim: &Simulation) -> Result<Vec<u8>, ConfigError> {
    serde_json::to_vec(sim).map_err(|e| ConfigError::Serialize {
        reason: e.to_string(),
    })
}
