use bytes::{Buf, BufMut, Bytes, BytesMut};
use mavwire_dialect::DialectRegistry;
use tracing::{debug, trace};

use crate::checksum::X25;
use crate::error::{DecodeError, DecodeResult, FrameError, Result};
use crate::packet::Packet;

/// Start-of-frame marker.
pub const START_MARKER: u8 = 0xFE;

/// Frame header: marker (1) + length (1) + sequence (1) + system (1) + component (1) + message (1).
pub const HEADER_SIZE: usize = 6;

/// Trailing checksum: u16 little-endian.
pub const CHECKSUM_SIZE: usize = 2;

/// Largest payload the single-byte length field can describe.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Largest possible frame on the wire.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CHECKSUM_SIZE;

/// The fixed six bytes that open every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub payload_len: u8,
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u8,
}

impl Header {
    /// Parse a header from bytes beginning at the start marker.
    ///
    /// Returns `None` if fewer than [`HEADER_SIZE`] bytes are present or the
    /// first byte is not [`START_MARKER`].
    pub fn parse(src: &[u8]) -> Option<Self> {
        match src {
            [START_MARKER, payload_len, sequence, system_id, component_id, message_id, ..] => {
                Some(Self {
                    payload_len: *payload_len,
                    sequence: *sequence,
                    system_id: *system_id,
                    component_id: *component_id,
                    message_id: *message_id,
                })
            }
            _ => None,
        }
    }

    /// Total frame length declared by this header.
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + usize::from(self.payload_len) + CHECKSUM_SIZE
    }

    /// A packet carrying only the header fields.
    pub fn to_packet(&self) -> Packet {
        Packet {
            sequence: self.sequence,
            system_id: self.system_id,
            component_id: self.component_id,
            message_id: self.message_id,
            ..Packet::default()
        }
    }
}

/// Checksum over the frame bytes after the start marker, then the crc-extra seed.
pub fn frame_checksum(covered: &[u8], crc_extra: u8) -> u16 {
    let mut crc = X25::new();
    crc.absorb(covered);
    crc.absorb_byte(crc_extra);
    crc.finalize()
}

/// Encode a packet into the wire format using `sequence` as its sequence id.
///
/// Wire format:
/// ```text
/// ┌────────┬─────┬─────┬────────┬─────────┬─────────┬───────────┬───────────┐
/// │ 0xFE   │ Len │ Seq │ SysID  │ CompID  │ MsgID   │ Payload   │ CRC       │
/// │ (1B)   │(1B) │(1B) │ (1B)   │ (1B)    │ (1B)    │ (Len B)   │ (2B LE)   │
/// └────────┴─────┴─────┴────────┴─────────┴─────────┴───────────┴───────────┘
/// ```
///
/// The checksum covers everything after the marker plus the crc-extra seed of
/// the message id. Nothing is appended to `dst` if the payload is too large or
/// the message id is unknown to `registry`.
pub fn encode_packet(
    packet: &Packet,
    sequence: u8,
    registry: &DialectRegistry,
    dst: &mut BytesMut,
) -> Result<()> {
    let payload_len = packet.payload.len();
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    let crc_extra = registry.lookup(packet.message_id)?;

    let start = dst.len();
    dst.reserve(HEADER_SIZE + payload_len + CHECKSUM_SIZE);
    dst.put_u8(START_MARKER);
    dst.put_u8(payload_len as u8);
    dst.put_u8(sequence);
    dst.put_u8(packet.system_id);
    dst.put_u8(packet.component_id);
    dst.put_u8(packet.message_id);
    dst.put_slice(&packet.payload);

    let checksum = frame_checksum(&dst[start + 1..], crc_extra);
    dst.put_u16_le(checksum);
    Ok(())
}

/// Decode one frame from a buffer that starts with it, such as a UDP datagram.
///
/// No scanning is performed: the buffer must begin with the start marker.
/// Bytes past the declared frame length are ignored.
pub fn decode_packet(src: &[u8], registry: &DialectRegistry) -> DecodeResult<Packet> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::InvalidHeader("buffer shorter than frame header").into());
    }
    let header = match Header::parse(src) {
        Some(header) => header,
        None => return Err(FrameError::InvalidHeader("missing start marker").into()),
    };

    let frame_len = header.frame_len();
    if src.len() < frame_len {
        return Err(DecodeError::new(
            FrameError::Truncated {
                expected: frame_len,
                available: src.len(),
            },
            Some(header.to_packet()),
        ));
    }

    verify_frame(Bytes::copy_from_slice(&src[..frame_len]), registry)
}

/// Verify a complete frame and split it into a [`Packet`].
pub(crate) fn verify_frame(frame: Bytes, registry: &DialectRegistry) -> DecodeResult<Packet> {
    let header = Header::parse(&frame)
        .ok_or(FrameError::InvalidHeader("missing start marker"))?;
    let frame_len = header.frame_len();
    if frame.len() < frame_len {
        return Err(DecodeError::new(
            FrameError::Truncated {
                expected: frame_len,
                available: frame.len(),
            },
            Some(header.to_packet()),
        ));
    }

    let payload_end = HEADER_SIZE + usize::from(header.payload_len);
    let mut packet = header.to_packet();
    packet.payload = frame.slice(HEADER_SIZE..payload_end);
    packet.checksum = u16::from_le_bytes([frame[payload_end], frame[payload_end + 1]]);

    let crc_extra = match registry.lookup(packet.message_id) {
        Ok(crc_extra) => crc_extra,
        Err(err) => {
            debug!(message_id = packet.message_id, "unknown message id");
            return Err(DecodeError::new(err.into(), Some(packet)));
        }
    };

    let computed = frame_checksum(&frame[1..payload_end], crc_extra);
    if computed != packet.checksum {
        debug!(
            message_id = packet.message_id,
            received = packet.checksum,
            computed,
            "checksum mismatch"
        );
        return Err(DecodeError::new(
            FrameError::ChecksumMismatch {
                received: packet.checksum,
                computed,
            },
            Some(packet),
        ));
    }

    trace!(
        sequence = packet.sequence,
        system_id = packet.system_id,
        component_id = packet.component_id,
        message_id = packet.message_id,
        payload_len = packet.payload.len(),
        "decoded packet"
    );
    Ok(packet)
}

/// Drop bytes up to the next start marker. Returns how many were dropped.
pub(crate) fn discard_until_marker(src: &mut BytesMut) -> usize {
    match src.iter().position(|&byte| byte == START_MARKER) {
        Some(offset) => {
            src.advance(offset);
            offset
        }
        None => {
            let dropped = src.len();
            src.clear();
            dropped
        }
    }
}

/// Configuration for packet readers and writers.
#[derive(Debug, Clone, Default)]
pub struct CodecConfig {
    /// First sequence id a writer assigns. Default: 0.
    pub initial_sequence: u8,
    /// Read timeout applied to TCP streams.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout applied to TCP streams.
    pub write_timeout: Option<std::time::Duration>,
}
