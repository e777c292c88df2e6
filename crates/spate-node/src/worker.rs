//! The worker side: receive a simulation, run it to completion, report
//! the results, repeat until told to stop.

use tracing::{debug, info, warn};

use spate_batch::{parse_simulation, ResultDocument};
use spate_comms::{JobMessage, WorkerEndpoint};
use spate_core::Simulation;
use spate_solver::{FluidSolver, Snapshot};

use crate::error::RunError;

/// What a worker is doing right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a control message.
    Idle,
    /// Running a simulation.
    Running,
    /// Shut down; the loop has exited.
    Stopped,
}

/// The loop a worker thread runs.
pub struct WorkerRuntime {
    endpoint: WorkerEndpoint,
    state: WorkerState,
}

impl WorkerRuntime {
    /// A runtime over one cluster endpoint.
    pub fn new(endpoint: WorkerEndpoint) -> Self {
        Self {
            endpoint,
            state: WorkerState::Idle,
        }
    }

    /// Current state. After [`run`](Self::run) returns `Ok` this is
    /// [`WorkerState::Stopped`]; after an error it reports where the
    /// loop was interrupted.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Process assignments until the shutdown order arrives.
    ///
    /// # Errors
    ///
    /// Any [`RunError`]; a worker that cannot parse, run, or report a
    /// simulation gives up rather than silently dropping the job.
    pub fn run(&mut self) -> Result<(), RunError> {
        let rank = self.endpoint.rank();
        loop {
            self.state = WorkerState::Idle;
            let msg = self.endpoint.recv_control()?;
            if msg.terminate {
                self.state = WorkerState::Stopped;
                info!(worker = %rank, "worker stopping");
                return Ok(());
            }

            self.state = WorkerState::Running;
            let expected = self.endpoint.probe_payload()?;
            let bytes = self.endpoint.recv_payload()?;
            debug!(worker = %rank, simulation = %msg.simulation_id, bytes = expected, "received config");

            let sim = parse_simulation(&bytes)?;
            info!(
                worker = %rank,
                simulation = %msg.simulation_id,
                ticks = sim.ticks,
                width = sim.world.width,
                height = sim.world.height,
                "running simulation"
            );
            let started = std::time::Instant::now();
            let snapshots = run_simulation(&sim)?;
            info!(
                worker = %rank,
                simulation = %msg.simulation_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "simulation finished"
            );

            let document = ResultDocument::new(msg.simulation_id, &sim, &snapshots);
            let payload = document.to_bytes()?;
            self.endpoint
                .send_completion(JobMessage::completion(msg.simulation_id), &payload)?;
        }
    }
}

/// Run one simulation to completion and capture its snapshot series.
///
/// Tick 0 applies perturbations only; every later tick applies its
/// perturbations and then advances the solver. A snapshot is captured
/// after every tick, so the series has `ticks + 1` entries and entry 0
/// is the perturbed initial state.
///
/// # Errors
///
/// [`RunError::Config`] when the config cannot produce a solver.
pub fn run_simulation(sim: &Simulation) -> Result<Vec<Snapshot>, RunError> {
    let mut solver = FluidSolver::from_simulation(sim)?;
    let mut snapshots = Vec::with_capacity(sim.ticks as usize + 1);

    for tick in 0..=sim.ticks {
        if let Some(m) = sim.mod_at(tick) {
            apply_mod(&mut solver, tick, m);
        }
        if tick > 0 {
            solver.tick();
        }
        snapshots.push(solver.snapshot());
    }
    Ok(snapshots)
}

/// Apply one tick's perturbations, densities before forces. A rejected
/// source is logged and skipped; it never aborts the simulation.
fn apply_mod(solver: &mut FluidSolver, tick: u64, m: &spate_core::Mod) {
    for source in &m.densities {
        if let Err(error) = solver.increase_density(source.x, source.y) {
            warn!(tick, %error, "skipping density source");
        }
    }
    for force in &m.forces {
        if let Err(error) = solver.apply_force(force.x, force.y, force.velocity.x, force.velocity.y)
        {
            warn!(tick, %error, "skipping force");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spate_core::SimulationId;

    fn parse(json: &str) -> Simulation {
        parse_simulation(json.as_bytes()).unwrap()
    }

    #[test]
    fn snapshot_series_has_ticks_plus_one_entries() {
        let sim = parse(
            r#"{
                "time_step": 0.01, "ticks": 4,
                "world": {"width": 5, "height": 5},
                "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001}
            }"#,
        );
        let snapshots = run_simulation(&sim).unwrap();
        assert_eq!(snapshots.len(), 5);
    }

    #[test]
    fn tick_zero_mod_appears_unstepped_in_first_snapshot() {
        let sim = parse(
            r#"{
                "time_step": 0.01, "ticks": 1,
                "world": {"width": 5, "height": 5},
                "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001},
                "mods": [{"tick": 0, "densities": [{"x": 2, "y": 2}]}]
            }"#,
        );
        let snapshots = run_simulation(&sim).unwrap();
        let first = &snapshots[0];
        assert_eq!(first.interior_cell(2, 2).d, 10.0);
        let spread: f64 = first.cells().iter().map(|c| c.d).sum();
        assert_eq!(spread, 10.0, "tick 0 must not diffuse the injection");
    }

    #[test]
    fn out_of_bounds_mod_is_skipped_not_fatal() {
        let sim = parse(
            r#"{
                "time_step": 0.01, "ticks": 1,
                "world": {"width": 5, "height": 5},
                "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001},
                "mods": [{"tick": 0, "densities": [{"x": 99, "y": 99}, {"x": 1, "y": 1}]}]
            }"#,
        );
        let snapshots = run_simulation(&sim).unwrap();
        assert_eq!(snapshots[0].interior_cell(1, 1).d, 10.0);
    }

    #[test]
    fn over_cap_force_is_skipped_not_fatal() {
        let sim = parse(
            r#"{
                "time_step": 0.01, "ticks": 1,
                "world": {"width": 5, "height": 5},
                "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001},
                "mods": [{"tick": 0, "forces": [
                    {"x": 2, "y": 2, "velocity": {"x": 500.0, "y": 0.0}},
                    {"x": 2, "y": 2, "velocity": {"x": 3.0, "y": 0.0}}
                ]}]
            }"#,
        );
        let snapshots = run_simulation(&sim).unwrap();
        assert_eq!(snapshots[0].interior_cell(2, 2).u, 3.0);
    }

    #[test]
    fn mods_on_later_ticks_are_applied_before_that_step() {
        let sim = parse(
            r#"{
                "time_step": 0.01, "ticks": 2,
                "world": {"width": 5, "height": 5},
                "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001},
                "mods": [{"tick": 2, "densities": [{"x": 2, "y": 2}]}]
            }"#,
        );
        let snapshots = run_simulation(&sim).unwrap();
        assert!(snapshots[1].cells().iter().all(|c| c.d == 0.0));
        let mass: f64 = snapshots[2].cells().iter().map(|c| c.d).sum();
        assert!(mass > 0.0, "tick 2 injection should appear in snapshot 2");
        assert!(
            snapshots[2].interior_cell(2, 2).d < 10.0,
            "injection at tick 2 is stepped before capture"
        );
    }

    #[test]
    fn completion_id_matches_assignment() {
        // End-to-end over a real endpoint pair.
        use spate_batch::serialize_simulation;
        use spate_comms::Cluster;

        let sim = parse(
            r#"{
                "time_step": 0.01, "ticks": 1,
                "world": {"width": 4, "height": 4},
                "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001}
            }"#,
        );

        let (master, endpoints) = Cluster::new(1);
        let handle = std::thread::spawn(move || {
            let mut endpoints = endpoints;
            let mut runtime = WorkerRuntime::new(endpoints.remove(0));
            let result = runtime.run();
            (result, runtime.state())
        });

        let rank = spate_core::WorkerRank(1);
        master
            .send_control(rank, JobMessage::assignment(SimulationId(11)))
            .unwrap();
        master
            .send_payload(rank, &serialize_simulation(&sim).unwrap())
            .unwrap();

        let (from, msg, payload) = master.recv_completion().unwrap();
        assert_eq!(from, rank);
        assert_eq!(msg, JobMessage::completion(SimulationId(11)));
        let document = ResultDocument::from_bytes(&payload).unwrap();
        assert_eq!(document.id, SimulationId(11));
        assert_eq!(document.snapshots.len(), 2);

        master.send_control(rank, JobMessage::shutdown()).unwrap();
        let (result, state) = handle.join().unwrap();
        result.unwrap();
        assert_eq!(state, WorkerState::Stopped);
    }

    #[test]
    fn state_machine_is_observable_across_the_lifecycle() {
        use spate_comms::Cluster;

        let (master, endpoints) = Cluster::new(1);
        let mut endpoints = endpoints;
        let mut runtime = WorkerRuntime::new(endpoints.remove(0));
        assert_eq!(runtime.state(), WorkerState::Idle);

        let rank = spate_core::WorkerRank(1);
        master.send_control(rank, JobMessage::shutdown()).unwrap();
        runtime.run().unwrap();
        assert_eq!(runtime.state(), WorkerState::Stopped);
    }

    #[test]
    fn disconnect_leaves_the_worker_short_of_stopped() {
        use spate_comms::Cluster;

        let (master, endpoints) = Cluster::new(1);
        let mut endpoints = endpoints;
        let mut runtime = WorkerRuntime::new(endpoints.remove(0));
        drop(master);
        assert!(runtime.run().is_err());
        assert_eq!(
            runtime.state(),
            WorkerState::Idle,
            "a disconnect hits while waiting for control traffic"
        );
    }
}
