//! Core types and validation for the Spate fluid-simulation batch runner.
//!
//! This crate holds the vocabulary shared by every other Spate crate:
//! strongly-typed identifiers, the [`Simulation`] record family parsed from
//! a job batch, and the error types for configuration and spatial failures.
//! It deliberately contains no solver, transport, or I/O code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod simulation;

pub use error::{ConfigError, SpatialError};
pub use id::{SimulationId, WorkerRank};
pub use simulation::{
    Batch, DensitySource, FluidParams, ForceSource, Mod, Simulation, Velocity, WorldExtent,
};
