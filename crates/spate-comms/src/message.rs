//! Fixed-size control frame exchanged between master and workers.

use spate_core::SimulationId;

use crate::error::CodecError;

/// The single control message of the protocol.
///
/// Sent master-to-worker it either assigns a simulation or, with
/// `terminate` set, tells the worker to stop; sent worker-to-master it
/// reports a finished simulation. The wire form is always
/// [`ENCODED_LEN`](JobMessage::ENCODED_LEN) bytes: one flag byte then
/// the simulation id as a little-endian `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobMessage {
    /// Shutdown flag. The id of a terminate message carries no meaning.
    pub terminate: bool,
    /// The simulation this message is about.
    pub simulation_id: SimulationId,
}

impl JobMessage {
    /// Exact length of every encoded control frame.
    pub const ENCODED_LEN: usize = 9;

    /// A work assignment for `id`.
    pub fn assignment(id: SimulationId) -> Self {
        Self {
            terminate: false,
            simulation_id: id,
        }
    }

    /// A completion report for `id`.
    pub fn completion(id: SimulationId) -> Self {
        Self {
            terminate: false,
            simulation_id: id,
        }
    }

    /// The shutdown order.
    pub fn shutdown() -> Self {
        Self {
            terminate: true,
            simulation_id: SimulationId(0),
        }
    }

    /// Encode into the fixed wire form.
    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut buf = [0u8; Self::ENCODED_LEN];
        buf[0] = u8::from(self.terminate);
        buf[1..].copy_from_slice(&self.simulation_id.0.to_le_bytes());
        buf
    }

    /// Decode a received frame.
    ///
    /// # Errors
    ///
    /// Rejects frames that are not exactly [`ENCODED_LEN`](Self::ENCODED_LEN)
    /// bytes and flag bytes other than 0 or 1.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(CodecError::Truncated {
                expected: Self::ENCODED_LEN,
                got: bytes.len(),
            });
        }
        let terminate = match bytes[0] {
            0 => false,
            1 => true,
            byte => return Err(CodecError::InvalidBool { byte }),
        };
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[1..]);
        Ok(Self {
            terminate,
            simulation_id: SimulationId(u64::from_le_bytes(id)),
        })
    }
}

/// Prefix `body` with its length as a little-endian `u32`.
///
/// # Panics
///
/// Panics if the body exceeds `u32::MAX` bytes; payloads are serialized
/// JSON documents well below that.
pub fn frame_payload(body: &[u8]) -> Vec<u8> {
    assert!(
        body.len() <= u32::MAX as usize,
        "payload of {} bytes exceeds frame limit",
        body.len()
    );
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(body);
    frame
}

/// Split a payload frame into its declared length and body.
///
/// # Errors
///
/// Rejects frames shorter than the 4-byte prefix and frames whose body
/// length disagrees with the prefix.
pub fn unframe_payload(frame: &[u8]) -> Result<&[u8], CodecError> {
    if frame.len() < 4 {
        return Err(CodecError::Truncated {
            expected: 4,
            got: frame.len(),
        });
    }
    let mut len = [0u8; 4];
    len.copy_from_slice(&frame[..4]);
    let declared = u32::from_le_bytes(len) as usize;
    let body = &frame[4..];
    if body.len() != declared {
        return Err(CodecError::LengthMismatch {
            declared,
            got: body.len(),
        });
    }
    Ok(body)
}
