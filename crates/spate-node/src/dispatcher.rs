//! The master side: hands simulations to idle workers and collects
//! their results.

use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::info;

use spate_batch::{serialize_simulation, ResultWriter};
use spate_comms::{JobMessage, MasterHandle, ProtocolError};
use spate_core::{Simulation, SimulationId, WorkerRank};

use crate::error::RunError;

struct WorkerSlot {
    rank: WorkerRank,
    busy: bool,
}

/// Drives a batch over a set of workers.
///
/// Scheduling is greedy: fresh workers are claimed in rank order until
/// every worker has a job, after which each new simulation goes to
/// whichever worker reports a completion first. Every assignment goes
/// through a busy check; a double-booked slot means the bookkeeping is
/// corrupt and the run aborts.
pub struct Dispatcher<'a> {
    master: &'a MasterHandle,
    writer: &'a ResultWriter,
    slots: Vec<WorkerSlot>,
    next_fresh: usize,
    artifacts: Vec<PathBuf>,
}

impl<'a> Dispatcher<'a> {
    /// A dispatcher over `master`'s workers, writing artifacts through
    /// `writer`.
    pub fn new(master: &'a MasterHandle, writer: &'a ResultWriter) -> Self {
        let slots = master
            .ranks()
            .map(|rank| WorkerSlot { rank, busy: false })
            .collect();
        Self {
            master,
            writer,
            slots,
            next_fresh: 0,
            artifacts: Vec::new(),
        }
    }

    /// Dispatch every simulation, wait for all results, then shut the
    /// workers down.
    ///
    /// # Errors
    ///
    /// Any [`RunError`]; the batch does not survive a failed worker or a
    /// failed artifact write.
    pub fn run(
        &mut self,
        simulations: &IndexMap<SimulationId, Simulation>,
    ) -> Result<(), RunError> {
        for (&id, sim) in simulations {
            let slot = self.claim_slot()?;
            self.assign(slot, id, sim)?;
        }
        self.drain()?;
        self.shutdown()?;
        Ok(())
    }

    /// Paths of every artifact written so far, in completion order.
    pub fn into_artifacts(self) -> Vec<PathBuf> {
        self.artifacts
    }

    fn claim_slot(&mut self) -> Result<usize, RunError> {
        if self.next_fresh < self.slots.len() {
            let slot = self.next_fresh;
            self.next_fresh += 1;
            return Ok(slot);
        }
        let rank = self.collect_completion()?;
        self.slot_index(rank)
    }

    fn assign(&mut self, slot: usize, id: SimulationId, sim: &Simulation) -> Result<(), RunError> {
        let rank = self.slots[slot].rank;
        if self.slots[slot].busy {
            return Err(ProtocolError::SlotBusy { rank }.into());
        }
        let payload = serialize_simulation(sim)?;
        self.master.send_control(rank, JobMessage::assignment(id))?;
        self.master.send_payload(rank, &payload)?;
        self.slots[slot].busy = true;
        info!(worker = %rank, simulation = %id, "dispatched simulation");
        Ok(())
    }

    /// Wait for any completion, persist its payload, and free the slot.
    fn collect_completion(&mut self) -> Result<WorkerRank, RunError> {
        let (rank, msg, payload) = self.master.recv_completion()?;
        let path = self
            .writer
            .write_encoded(msg.simulation_id, rank, &payload)?;
        info!(
            worker = %rank,
            simulation = %msg.simulation_id,
            artifact = %path.display(),
            "simulation complete"
        );
        self.artifacts.push(path);
        let slot = self.slot_index(rank)?;
        self.slots[slot].busy = false;
        Ok(rank)
    }

    fn drain(&mut self) -> Result<(), RunError> {
        while self.slots.iter().any(|s| s.busy) {
            self.collect_completion()?;
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<(), RunError> {
        for slot in &self.slots {
            self.master.send_control(slot.rank, JobMessage::shutdown())?;
        }
        Ok(())
    }

    fn slot_index(&self, rank: WorkerRank) -> Result<usize, RunError> {
        self.slots
            .iter()
            .position(|s| s.rank == rank)
            .ok_or_else(|| ProtocolError::Disconnected { rank: Some(rank) }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use spate_batch::parse_batch;
    use spate_comms::Cluster;

    use crate::worker::WorkerRuntime;

    fn three_simulations() -> IndexMap<SimulationId, Simulation> {
        parse_batch(
            r#"{
                "simulations": [
                    {"time_step": 0.01, "ticks": 1,
                     "world": {"width": 4, "height": 4},
                     "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001}},
                    {"time_step": 0.01, "ticks": 2,
                     "world": {"width": 4, "height": 4},
                     "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001}},
                    {"time_step": 0.01, "ticks": 1,
                     "world": {"width": 6, "height": 3},
                     "fluid": {"viscosity": 0.0001, "density": 10.0, "diffusion": 0.0001}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn double_assignment_is_a_slot_busy_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path()).unwrap();
        let (master, _workers) = Cluster::new(1);
        let mut dispatcher = Dispatcher::new(&master, &writer);

        let sims = three_simulations();
        let (&id, sim) = sims.first().unwrap();
        dispatcher.assign(0, id, sim).unwrap();
        let err = dispatcher.assign(0, id, sim).unwrap_err();
        assert!(matches!(
            err,
            RunError::Protocol(ProtocolError::SlotBusy {
                rank: WorkerRank(1)
            })
        ));
    }

    #[test]
    fn fresh_workers_are_claimed_in_rank_order() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path()).unwrap();
        let (master, _workers) = Cluster::new(3);
        let mut dispatcher = Dispatcher::new(&master, &writer);

        assert_eq!(dispatcher.claim_slot().unwrap(), 0);
        assert_eq!(dispatcher.claim_slot().unwrap(), 1);
        assert_eq!(dispatcher.claim_slot().unwrap(), 2);
    }

    #[test]
    fn run_completes_with_more_simulations_than_workers() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path()).unwrap();
        let (master, endpoints) = Cluster::new(2);

        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|ep| {
                thread::spawn(move || {
                    let mut runtime = WorkerRuntime::new(ep);
                    runtime.run()
                })
            })
            .collect();

        let mut dispatcher = Dispatcher::new(&master, &writer);
        dispatcher.run(&three_simulations()).unwrap();
        let artifacts = dispatcher.into_artifacts();
        assert_eq!(artifacts.len(), 3);
        for path in &artifacts {
            assert!(path.exists(), "missing artifact {}", path.display());
        }

        // Workers exit cleanly once they see the shutdown order.
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
    }

    #[test]
    fn every_worker_gets_exactly_one_terminate_and_it_is_final() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(dir.path()).unwrap();
        let (master, endpoints) = Cluster::new(2);

        // Scripted workers that record every control frame they see and
        // acknowledge each job with a minimal completion.
        let recorders: Vec<_> = endpoints
            .into_iter()
            .map(|mut endpoint| {
                thread::spawn(move || {
                    let mut frames = Vec::new();
                    loop {
                        let msg = endpoint.recv_control().unwrap();
                        frames.push(msg);
                        if msg.terminate {
                            return frames;
                        }
                        endpoint.recv_payload().unwrap();
                        endpoint
                            .send_completion(JobMessage::completion(msg.simulation_id), b"{}")
                            .unwrap();
                    }
                })
            })
            .collect();

        let mut dispatcher = Dispatcher::new(&master, &writer);
        dispatcher.run(&three_simulations()).unwrap();

        let mut jobs_seen = 0;
        for handle in recorders {
            let frames = handle.join().unwrap();
            let terminates = frames.iter().filter(|m| m.terminate).count();
            assert_eq!(terminates, 1, "each worker sees exactly one terminate");
            assert!(
                frames.last().is_some_and(|m| m.terminate),
                "the terminate must be the last frame a worker receives"
            );
            jobs_seen += frames.len() - 1;
        }
        assert_eq!(jobs_seen, 3, "every simulation dispatched exactly once");
    }
}
