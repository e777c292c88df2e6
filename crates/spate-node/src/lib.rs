//! The batch runner: one master thread driving a pool of worker
//! threads, each running fluid simulations end to end.
//!
//! [`run_batch`] is the entry point. The master parses and validates the
//! batch up front, then farms simulations out over a
//! [`spate_comms::Cluster`]; workers run their assigned simulation with
//! [`spate_solver::FluidSolver`] and ship the encoded result document
//! back, which the master persists through [`spate_batch::ResultWriter`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod worker;

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use spate_batch::{parse_batch, ResultWriter};
use spate_comms::Cluster;
use spate_core::WorkerRank;

pub use config::RunConfig;
pub use dispatcher::Dispatcher;
pub use error::RunError;
pub use worker::{run_simulation, WorkerRuntime, WorkerState};

/// What a finished run produced.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Number of simulations in the batch.
    pub simulations: u64,
    /// Artifact paths, in completion order.
    pub artifacts: Vec<PathBuf>,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
}

/// Run a whole batch: parse, dispatch, collect, shut down.
///
/// Blocks until every simulation has finished and every worker thread
/// has been joined.
///
/// # Errors
///
/// Any [`RunError`]. A panicked worker is reported as
/// [`RunError::WorkerPanicked`] in preference to the secondary protocol
/// errors it causes.
pub fn run_batch(config: &RunConfig, batch_text: &str) -> Result<RunReport, RunError> {
    let started = Instant::now();
    let simulations = parse_batch(batch_text)?;
    let writer = ResultWriter::new(config.output_dir())?;
    info!(
        workers = config.workers(),
        simulations = simulations.len(),
        "starting batch run"
    );

    let (master, endpoints) = Cluster::new(config.workers());
    let handles: Vec<(WorkerRank, thread::JoinHandle<Result<(), RunError>>)> = endpoints
        .into_iter()
        .map(|endpoint| {
            let rank = endpoint.rank();
            (
                rank,
                thread::spawn(move || {
                    let mut runtime = WorkerRuntime::new(endpoint);
                    runtime.run()
                }),
            )
        })
        .collect();

    let mut dispatcher = Dispatcher::new(&master, &writer);
    let dispatch_result = dispatcher.run(&simulations);
    let artifacts = dispatcher.into_artifacts();

    // Closing the inboxes unblocks any worker still waiting on a control
    // message after a dispatch failure.
    drop(master);

    let mut worker_failure = None;
    for (rank, handle) in handles {
        match handle.join() {
            Err(_) => return Err(RunError::WorkerPanicked { rank }),
            Ok(Err(e)) if worker_failure.is_none() => worker_failure = Some(e),
            Ok(_) => {}
        }
    }

    dispatch_result?;
    if let Some(e) = worker_failure {
        return Err(e);
    }

    let elapsed = started.elapsed();
    info!(
        simulations = simulations.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "batch run complete"
    );
    Ok(RunReport {
        simulations: simulations.len() as u64,
        artifacts,
        elapsed,
    })
}
