//! Stable-fluids grid solver for the Spate batch runner.
//!
//! One [`FluidSolver`] owns the full grid state for a single simulation:
//! three double-buffered scalar fields (`u`, `v`, `density`) over a
//! `(width + 2) × (height + 2)` cell layout where index 0 and the last
//! index on each axis are boundary cells mirroring the interior. The
//! integrator is unconditionally stable: implicit Gauss-Seidel relaxation
//! for diffusion, semi-Lagrangian backtracing for advection, and a pressure
//! projection enforcing approximate incompressibility.
//!
//! The grid kernels live in [`kernels`] as free functions over [`Field`]s
//! so they can be exercised and property-tested in isolation; the solver
//! sequences them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod field;
pub mod kernels;
pub mod snapshot;
pub mod solver;

pub use field::{Field, FieldPair};
pub use kernels::Boundary;
pub use snapshot::{CellState, Snapshot};
pub use solver::{FluidSolver, MAX_FORCE_VELOCITY};
