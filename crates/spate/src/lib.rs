//! Spate: a master/worker batch runner for 2D incompressible fluid
//! simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Spate sub-crates. For most users, adding `spate` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use spate::prelude::*;
//!
//! // A 10×10 world stepped directly, without the cluster machinery.
//! let mut solver = FluidSolver::new(10, 10, 0.0001, 10.0, 0.0001, 0.01).unwrap();
//! solver.increase_density(5, 5).unwrap();
//! solver.apply_force(5, 5, 2.0, 0.0).unwrap();
//! solver.tick();
//!
//! let snapshot = solver.snapshot();
//! assert!(snapshot.interior_cell(5, 5).d > 0.0);
//! ```
//!
//! Whole batches run through [`node::run_batch`]: the batch JSON is parsed
//! and validated up front, worker threads run the simulations, and each
//! finished simulation lands as a JSON artifact in the output directory.
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `spate-core` | IDs, simulation records, config and spatial errors |
//! | [`solver`] | `spate-solver` | The fluid solver, fields, and snapshots |
//! | [`comms`] | `spate-comms` | Control-message codec and the cluster transport |
//! | [`batch`] | `spate-batch` | Batch loading and result artifact writing |
//! | [`node`] | `spate-node` | The dispatcher, worker runtime, and `run_batch` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and IDs (`spate-core`).
///
/// Simulation records ([`types::Simulation`], [`types::Mod`]), the id
/// newtypes, and the config/spatial error enums.
pub use spate_core as types;

/// The fluid solver (`spate-solver`).
///
/// [`solver::FluidSolver`] owns the grids and steps them; [`solver::Snapshot`]
/// captures full grid state per tick.
pub use spate_solver as solver;

/// Cluster transport and wire codec (`spate-comms`).
///
/// [`comms::Cluster`] wires one master to its workers;
/// [`comms::JobMessage`] is the fixed-size control frame.
pub use spate_comms as comms;

/// Batch loading and artifact writing (`spate-batch`).
///
/// [`batch::parse_batch`] validates a batch file eagerly;
/// [`batch::ResultWriter`] persists per-simulation result documents.
pub use spate_batch as batch;

/// The batch runner (`spate-node`).
///
/// [`node::run_batch`] is the end-to-end entry point; [`node::Dispatcher`]
/// and [`node::WorkerRuntime`] are its two halves.
pub use spate_node as node;

/// Common imports for typical Spate usage.
///
/// ```rust
/// use spate::prelude::*;
/// ```
pub mod prelude {
    pub use spate_batch::{parse_batch, ResultDocument, ResultWriter};
    pub use spate_core::{
        Batch, FluidParams, Mod, Simulation, SimulationId, WorkerRank, WorldExtent,
    };
    pub use spate_node::{run_batch, RunConfig, RunError, RunReport};
    pub use spate_solver::{FluidSolver, Snapshot, MAX_FORCE_VELOCITY};
}
