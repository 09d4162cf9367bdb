//! Streaming CRC-16/X25 accumulator.
//!
//! This is the MAVLink flavour of X25: reflected polynomial 0x1021, initial
//! value 0xFFFF and no final complement, so the sum is the raw register
//! (catalogued as CRC-16/MCRF4XX).

use std::fmt;

use crc::{Crc, Digest, CRC_16_MCRF4XX};

/// Initial register value.
pub const X25_INIT: u16 = 0xFFFF;

static MCRF4XX: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// Running checksum state.
#[derive(Clone)]
pub struct X25 {
    digest: Digest<'static, u16>,
}

impl X25 {
    pub fn new() -> Self {
        Self {
            digest: MCRF4XX.digest(),
        }
    }

    pub fn absorb_byte(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    pub fn absorb(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// Current 16-bit sum. Absorbing may continue afterwards.
    pub fn sum(&self) -> u16 {
        self.digest.clone().finalize()
    }

    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for X25 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for X25 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X25").field("sum", &self.sum()).finish()
    }
}

/// One-shot checksum of a byte slice.
pub fn x25(bytes: &[u8]) -> u16 {
    MCRF4XX.checksum(bytes)
}
