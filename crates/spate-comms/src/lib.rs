//! Wire codec and in-process transport for the master/worker cluster.
//!
//! Control traffic between the master and each worker is a fixed-size
//! [`JobMessage`] frame; bulk payloads (simulation configs, result
//! documents) travel as length-prefixed byte frames. [`cluster::Cluster`]
//! wires the two sides together over channels: one FIFO inbox per worker
//! for master-to-worker traffic and a single shared completion channel
//! going the other way, so the master can wait on whichever worker
//! finishes first.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod message;

pub use cluster::{Cluster, MasterHandle, WorkerEndpoint};
pub use error::{CodecError, ProtocolError};
pub use message::JobMessage;
