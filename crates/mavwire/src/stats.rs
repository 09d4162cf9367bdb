use std::collections::HashMap;

use mavwire_frame::{sequence_gap, DecodeError, FrameError, Packet};
use serde::Serialize;

/// Per-link decode counters with sequence loss tracking per source.
#[derive(Debug, Default, Serialize)]
pub struct LinkStats {
    pub decoded: u64,
    pub checksum_failures: u64,
    pub unknown_ids: u64,
    pub truncated: u64,
    pub other_errors: u64,
    pub lost: u64,
    #[serde(skip)]
    last_sequence: HashMap<(u8, u8), u8>,
}

impl LinkStats {
    /// Count a verified packet. Returns the number of packets missed from its
    /// source since the previous one.
    pub fn record_packet(&mut self, packet: &Packet) -> u8 {
        self.decoded += 1;
        let source = (packet.system_id, packet.component_id);
        let gap = match self.last_sequence.insert(source, packet.sequence) {
            Some(previous) => sequence_gap(previous, packet.sequence),
            None => 0,
        };
        self.lost += u64::from(gap);
        gap
    }

    pub fn record_error(&mut self, err: &DecodeError) {
        match err.kind() {
            FrameError::ChecksumMismatch { .. } => self.checksum_failures += 1,
            FrameError::UnknownMessage(_) => self.unknown_ids += 1,
            FrameError::Truncated { .. } => self.truncated += 1,
            _ => self.other_errors += 1,
        }
    }

    pub fn errors(&self) -> u64 {
        self.checksum_failures + self.unknown_ids + self.truncated + self.other_errors
    }
}
