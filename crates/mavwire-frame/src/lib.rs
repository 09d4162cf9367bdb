//! Packet framing for MAVLink 1.0 telemetry and command links.
//!
//! Every packet on the wire is framed as:
//! - A start marker (`0xFE`) used for stream synchronization
//! - A 5-byte header: payload length, sequence, system id, component id, message id
//! - Up to 255 payload bytes
//! - A little-endian CRC-16/X25 checksum seeded with the message's crc-extra byte
//!
//! Decoding skips garbage until the next start marker and verifies the checksum
//! against the [`DialectRegistry`]. Encoding stamps the writer's own sequence
//! number on every packet.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod message;
pub mod packet;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use checksum::X25;
pub use codec::{
    decode_packet, encode_packet, frame_checksum, CodecConfig, Header, CHECKSUM_SIZE,
    HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, START_MARKER,
};
pub use error::{DecodeError, DecodeResult, FrameError, Result};
pub use mavwire_dialect::{Dialect, DialectRegistry, MessageInfo};
pub use message::Message;
pub use packet::{sequence_gap, Packet};
pub use reader::{PacketDecoder, PacketReader};
pub use writer::PacketWriter;

#[cfg(feature = "async")]
pub use async_codec::PacketCodec;
