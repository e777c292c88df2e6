//! The simulation record family: the typed, immutable representation of one
//! parsed job and the batch document that contains it.
//!
//! Records are plain `serde` data types mirroring the batch JSON schema.
//! They carry no behavior beyond [`Simulation::validate`] (eager domain
//! checks, run before any job is dispatched) and [`Simulation::mod_at`]
//! (exact-tick perturbation lookup).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ConfigError;

/// A batch document: the list of simulations to distribute, in submission
/// order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// The simulations, in the order they will be dispatched.
    pub simulations: Vec<Simulation>,
}

/// One parsed simulation job. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// Duration of one tick. Must be positive and finite.
    pub time_step: f64,
    /// Number of solver steps to run. Must be positive. The run records
    /// `ticks + 1` snapshots: tick 0 captures the unstepped initial state.
    pub ticks: u64,
    /// Interior grid dimensions.
    pub world: WorldExtent,
    /// Fluid constants.
    pub fluid: FluidParams,
    /// Scripted perturbations, at most one meaningful entry per tick.
    #[serde(default)]
    pub mods: Vec<Mod>,
}

/// Interior grid dimensions of a simulation world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldExtent {
    /// Interior cell count along x. Must be > 0.
    pub width: u64,
    /// Interior cell count along y. Must be > 0.
    pub height: u64,
}

/// Fluid constants for a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluidParams {
    /// Viscosity used by the velocity diffusion solve.
    pub viscosity: f64,
    /// Amount added to a cell by one density injection.
    pub density: f64,
    /// Diffusion coefficient for the density field.
    pub diffusion: f64,
}

/// A scripted perturbation bound to one tick.
///
/// `densities` and `forces` may be empty or absent in the source document.
/// Lookup is by exact tick match; duplicate ticks are not rejected but only
/// the first match is applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mod {
    /// The tick this perturbation applies to.
    pub tick: u64,
    /// Density injections, applied before any forces.
    #[serde(default)]
    pub densities: SmallVec<[DensitySource; 4]>,
    /// Velocity overrides, applied after all density injections.
    #[serde(default)]
    pub forces: SmallVec<[ForceSource; 4]>,
}

/// One density injection site (interior coordinates, 0-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensitySource {
    /// Interior x coordinate.
    pub x: u64,
    /// Interior y coordinate.
    pub y: u64,
}

/// One velocity override site (interior coordinates, 0-based).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForceSource {
    /// Interior x coordinate.
    pub x: u64,
    /// Interior y coordinate.
    pub y: u64,
    /// Velocity components to apply. A component of exactly `0.0` leaves
    /// the existing value in place.
    pub velocity: Velocity,
}

/// A 2D velocity value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Simulation {
    /// Check every field against its domain.
    ///
    /// Run eagerly at parse time so that a malformed batch aborts the run
    /// before a single job is dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first offending
    /// field: non-positive or non-finite `time_step`, zero `ticks`, zero
    /// world dimensions, or non-positive or non-finite fluid constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if !(v > 0.0) || !v.is_finite() {
                return Err(ConfigError::InvalidField {
                    field,
                    reason: format!("must be positive and finite, got {v}"),
                });
            }
            Ok(())
        }

        positive("time_step", self.time_step)?;
        if self.ticks == 0 {
            return Err(ConfigError::InvalidField {
                field: "ticks",
                reason: "must be > 0".into(),
            });
        }
        if self.world.width == 0 {
            return Err(ConfigError::InvalidField {
                field: "world.width",
                reason: "must be > 0".into(),
            });
        }
        if self.world.height == 0 {
            return Err(ConfigError::InvalidField {
                field: "world.height",
                reason: "must be > 0".into(),
            });
        }
        positive("fluid.viscosity", self.fluid.viscosity)?;
        positive("fluid.density", self.fluid.density)?;
        positive("fluid.diffusion", self.fluid.diffusion)?;
        Ok(())
    }

    /// The perturbation scheduled for `tick`, if any.
    ///
    /// The mod list is small, so a linear scan is fine.
    pub fn mod_at(&self, tick: u64) -> Option<&Mod> {
        self.mods.iter().find(|m| m.tick == tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn valid_simulation() -> Simulation {
        Simulation {
            time_step: 0.01,
            ticks: 2,
            world: WorldExtent {
                width: 10,
                height: 10,
            },
            fluid: FluidParams {
                viscosity: 0.0001,
                density: 10.0,
                diffusion: 0.0001,
            },
            mods: vec![Mod {
                tick: 0,
                densities: smallvec![DensitySource { x: 5, y: 5 }],
                forces: smallvec![],
            }],
        }
    }

    #[test]
    fn valid_simulation_passes_validation() {
        assert!(valid_simulation().validate().is_ok());
    }

    #[test]
    fn zero_ticks_rejected() {
        let mut sim = valid_simulation();
        sim.ticks = 0;
        let err = sim.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField { field: "ticks", .. }
        ));
    }

    #[test]
    fn zero_width_rejected() {
        let mut sim = valid_simulation();
        sim.world.width = 0;
        assert!(matches!(
            sim.validate(),
            Err(ConfigError::InvalidField {
                field: "world.width",
                ..
            })
        ));
    }

    #[test]
    fn negative_time_step_rejected() {
        let mut sim = valid_simulation();
        sim.time_step = -0.5;
        assert!(matches!(
            sim.validate(),
            Err(ConfigError::InvalidField {
                field: "time_step",
                ..
            })
        ));
    }

    #[test]
    fn nan_viscosity_rejected() {
        let mut sim = valid_simulation();
        sim.fluid.viscosity = f64::NAN;
        assert!(matches!(
            sim.validate(),
            Err(ConfigError::InvalidField {
                field: "fluid.viscosity",
                ..
            })
        ));
    }

    #[test]
    fn infinite_diffusion_rejected() {
        let mut sim = valid_simulation();
        sim.fluid.diffusion = f64::INFINITY;
        assert!(matches!(
            sim.validate(),
            Err(ConfigError::InvalidField {
                field: "fluid.diffusion",
                ..
            })
        ));
    }

    #[test]
    fn mod_lookup_matches_exact_tick_only() {
        let sim = valid_simulation();
        assert!(sim.mod_at(0).is_some());
        assert!(sim.mod_at(1).is_none());
        assert!(sim.mod_at(2).is_none());
    }

    #[test]
    fn missing_mods_defaults_to_empty() {
        let json = r#"{
            "time_step": 0.01, "ticks": 5,
            "world": {"width": 4, "height": 4},
            "fluid": {"viscosity": 0.1, "density": 1.0, "diffusion": 0.1}
        }"#;
        let sim: Simulation = serde_json::from_str(json).unwrap();
        assert!(sim.mods.is_empty());
        assert!(sim.validate().is_ok());
    }

    #[test]
    fn mod_with_absent_lists_defaults_to_empty() {
        let json = r#"{"tick": 3}"#;
        let m: Mod = serde_json::from_str(json).unwrap();
        assert!(m.densities.is_empty());
        assert!(m.forces.is_empty());
    }
}
