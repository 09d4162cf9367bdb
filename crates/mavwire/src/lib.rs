//! MAVLink 1.0 packet framing for telemetry and command links.
//!
//! # Crate Structure
//!
//! - [`dialect`]: message tables mapping ids to crc-extra seeds
//! - [`frame`]: packet codec, streaming reader/writer and checksums

/// Re-export dialect types.
pub mod dialect {
    pub use mavwire_dialect::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mavwire_frame::*;
}
