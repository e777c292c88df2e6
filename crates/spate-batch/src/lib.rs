//! Reading batch files and writing per-simulation result artifacts.
//!
//! A batch is a JSON document listing simulation configs; the loader
//! parses and validates it eagerly, assigning [`spate_core::SimulationId`]s
//! in file order. The writer turns a finished simulation's snapshot
//! series into a self-describing JSON artifact on disk.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod loader;
pub mod writer;

pub use loader::{load_batch, parse_batch, parse_simulation, serialize_simulation};
pub use writer::{ArtifactError, ResultDocument, ResultWriter};
