//! Channel-backed transport connecting one master to its workers.

use crossbeam_channel::{unbounded, Receiver, Sender};

use spate_core::WorkerRank;

use crate::error::ProtocolError;
use crate::message::{self, JobMessage};

/// Builder for a master/worker channel mesh.
///
/// Each worker gets a private unbounded FIFO inbox from the master, so a
/// control frame and the payload frames that follow it arrive in order.
/// All workers share one completion channel back to the master; frames on
/// it are tagged with the sender's rank, which is how the master waits
/// for whichever worker finishes first.
pub struct Cluster;

impl Cluster {
    /// Wire up a master and `worker_count` workers.
    ///
    /// Workers are ranked `1..=worker_count`; rank 0 is the master.
    ///
    /// # Panics
    ///
    /// Panics when `worker_count` is zero.
    pub fn new(worker_count: u32) -> (MasterHandle, Vec<WorkerEndpoint>) {
        assert!(worker_count > 0, "a cluster needs at least one worker");

        let (completion_tx, completion_rx) = unbounded();
        let mut ports = Vec::with_capacity(worker_count as usize);
        let mut endpoints = Vec::with_capacity(worker_count as usize);

        for rank in 1..=worker_count {
            let rank = WorkerRank(rank);
            let (inbox_tx, inbox_rx) = unbounded();
            ports.push(MasterPort {
                rank,
                inbox: inbox_tx,
            });
            endpoints.push(WorkerEndpoint {
                rank,
                inbox: inbox_rx,
                completions: completion_tx.clone(),
                pending_payload: None,
            });
        }

        (
            MasterHandle {
                ports,
                completions: completion_rx,
            },
            endpoints,
        )
    }
}

struct MasterPort {
    rank: WorkerRank,
    inbox: Sender<Vec<u8>>,
}

/// The master's side of the mesh.
///
/// Dropping the handle closes every worker inbox, which workers observe
/// as [`ProtocolError::Disconnected`].
pub struct MasterHandle {
    ports: Vec<MasterPort>,
    completions: Receiver<(WorkerRank, Vec<u8>)>,
}

impl MasterHandle {
    /// Number of workers in the mesh.
    pub fn worker_count(&self) -> usize {
        self.ports.len()
    }

    /// Ranks of all workers, in rank order.
    pub fn ranks(&self) -> impl Iterator<Item = WorkerRank> + '_ {
        self.ports.iter().map(|p| p.rank)
    }

    /// Send a control frame to one worker.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Disconnected`] when the worker is gone.
    pub fn send_control(&self, rank: WorkerRank, msg: JobMessage) -> Result<(), ProtocolError> {
        self.port(rank)?
            .inbox
            .send(msg.encode().to_vec())
            .map_err(|_| ProtocolError::Disconnected { rank: Some(rank) })
    }

    /// Send a length-prefixed payload frame to one worker.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Disconnected`] when the worker is gone.
    pub fn send_payload(&self, rank: WorkerRank, body: &[u8]) -> Result<(), ProtocolError> {
        self.port(rank)?
            .inbox
            .send(message::frame_payload(body))
            .map_err(|_| ProtocolError::Disconnected { rank: Some(rank) })
    }

    /// Block until any worker reports a completion.
    ///
    /// Returns the reporting rank, the decoded control frame, and the
    /// result payload that accompanied it.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Disconnected`] when every worker has exited, and
    /// [`ProtocolError::Codec`] for a malformed completion frame.
    pub fn recv_completion(&self) -> Result<(WorkerRank, JobMessage, Vec<u8>), ProtocolError> {
        let (rank, frame) = self
            .completions
            .recv()
            .map_err(|_| ProtocolError::Disconnected { rank: None })?;
        if frame.len() < JobMessage::ENCODED_LEN {
            return Err(ProtocolError::Codec(crate::error::CodecError::Truncated {
                expected: JobMessage::ENCODED_LEN,
                got: frame.len(),
            }));
        }
        let (control, payload) = frame.split_at(JobMessage::ENCODED_LEN);
        let msg = JobMessage::decode(control)?;
        let body = message::unframe_payload(payload)?;
        Ok((rank, msg, body.to_vec()))
    }

    fn port(&self, rank: WorkerRank) -> Result<&MasterPort, ProtocolError> {
        self.ports
            .iter()
            .find(|p| p.rank == rank)
            .ok_or(ProtocolError::Disconnected { rank: Some(rank) })
    }
}

/// One worker's side of the mesh.
pub struct WorkerEndpoint {
    rank: WorkerRank,
    inbox: Receiver<Vec<u8>>,
    completions: Sender<(WorkerRank, Vec<u8>)>,
    pending_payload: Option<Vec<u8>>,
}

impl WorkerEndpoint {
    /// This worker's rank.
    pub fn rank(&self) -> WorkerRank {
        self.rank
    }

    /// Block until the master sends a control frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Disconnected`] when the master handle is dropped
    /// and [`ProtocolError::Codec`] for a malformed frame.
    pub fn recv_control(&mut self) -> Result<JobMessage, ProtocolError> {
        let frame = self.recv_frame()?;
        Ok(JobMessage::decode(&frame)?)
    }

    /// Block until a payload frame arrives and return its body length
    /// without consuming it; the frame stays queued for
    /// [`recv_payload`](Self::recv_payload).
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Disconnected`] when the master handle is dropped
    /// and [`ProtocolError::Codec`] for a malformed frame.
    pub fn probe_payload(&mut self) -> Result<usize, ProtocolError> {
        if self.pending_payload.is_none() {
            let frame = self.recv_frame()?;
            message::unframe_payload(&frame)?;
            self.pending_payload = Some(frame);
        }
        let frame = self
            .pending_payload
            .as_deref()
            .ok_or(ProtocolError::Disconnected { rank: None })?;
        Ok(frame.len() - 4)
    }

    /// Receive the next payload frame body, consuming a probed frame if
    /// one is pending.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Disconnected`] when the master handle is dropped
    /// and [`ProtocolError::Codec`] for a malformed frame.
    pub fn recv_payload(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let frame = match self.pending_payload.take() {
            Some(frame) => frame,
            None => self.recv_frame()?,
        };
        Ok(message::unframe_payload(&frame)?.to_vec())
    }

    /// Report a finished simulation: the control frame and its result
    /// payload travel as one completion frame so they cannot interleave
    /// with another worker's report.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Disconnected`] when the master handle is dropped.
    pub fn send_completion(&self, msg: JobMessage, payload: &[u8]) -> Result<(), ProtocolError> {
        let mut frame = msg.encode().to_vec();
        frame.extend_from_slice(&message::frame_payload(payload));
        self.completions
            .send((self.rank, frame))
            .map_err(|_| ProtocolError::Disconnected { rank: None })
    }

    fn recv_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        self.inbox
            .recv()
            .map_err(|_| ProtocolError::Disconnected { rank: None })
    }
}
