use bytes::Bytes;

use crate::codec::{CHECKSUM_SIZE, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::message::Message;

/// One frame on the wire, either decoded or waiting to be encoded.
///
/// `payload` must not exceed [`MAX_PAYLOAD_SIZE`](crate::MAX_PAYLOAD_SIZE)
/// bytes; the encoder rejects larger payloads. `sequence` and `checksum` are
/// ignored on encode: the writer assigns the sequence and computes the sum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u8,
    pub payload: Bytes,
    pub checksum: u16,
}

impl Packet {
    /// Create a packet for `message_id` with zeroed sender identity.
    pub fn new(message_id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            message_id,
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Set the sender identity.
    pub fn with_source(mut self, system_id: u8, component_id: u8) -> Self {
        self.system_id = system_id;
        self.component_id = component_id;
        self
    }

    /// The total wire size of this packet (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }

    /// Unpack the payload as message type `M`.
    pub fn unpack<M: Message>(&self) -> Result<M> {
        if self.message_id != M::MESSAGE_ID {
            return Err(FrameError::MessageMismatch {
                expected: M::MESSAGE_ID,
                actual: self.message_id,
            });
        }
        M::unpack(self)
    }
}

/// Number of packets missing between two consecutive sequence ids, modulo 256.
///
/// `sequence_gap(4, 5) == 0`; `sequence_gap(255, 1) == 1`. A repeated id reads
/// as a gap of 255.
pub fn sequence_gap(previous: u8, current: u8) -> u8 {
    current.wrapping_sub(previous).wrapping_sub(1)
}
