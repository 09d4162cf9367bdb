//! `tokio_util::codec` adapter for use with `FramedRead` / `FramedWrite`.
//!
//! Decoded items are `DecodeResult<Packet>`: a corrupt or unknown frame is
//! yielded as an `Err` item and the stream keeps going. Only I/O failures end
//! the stream.

use std::sync::Arc;

use bytes::BytesMut;
use mavwire_dialect::{Dialect, DialectRegistry};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::{discard_until_marker, encode_packet, Header, HEADER_SIZE};
use crate::error::{DecodeError, DecodeResult, FrameError};
use crate::packet::Packet;
use crate::reader::PacketDecoder;

/// Packet codec with independent receive and send sequence tracking.
///
/// The send sequence is claimed when a frame is encoded into the write buffer.
/// `FramedWrite` flushes that buffer later, so a frame lost to a failed flush
/// still consumes its id. [`PacketWriter`](crate::PacketWriter) advances only
/// after a successful flush; use it when gaps on the wire must mean loss.
#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    decoder: PacketDecoder,
    sequence: u8,
}

impl PacketCodec {
    /// Create a codec with the default registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Arc<DialectRegistry>) -> Self {
        Self {
            decoder: PacketDecoder::with_registry(registry),
            sequence: 0,
        }
    }

    /// Sequence id of the last successfully decoded packet.
    pub fn last_sequence(&self) -> u8 {
        self.decoder.last_sequence()
    }

    /// Sequence id the next encoded packet will carry.
    pub fn next_sequence(&self) -> u8 {
        self.sequence
    }

    pub fn registry(&self) -> &DialectRegistry {
        self.decoder.registry()
    }

    pub fn register_dialect(&mut self, dialect: impl Into<Arc<Dialect>>) {
        self.decoder.register_dialect(dialect);
    }

    fn encode_one(&mut self, packet: &Packet, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_packet(packet, self.sequence, self.decoder.registry(), dst)?;
        // Claimed here: the codec never sees the flush.
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }
}

impl Decoder for PacketCodec {
    type Item = DecodeResult<Packet>;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let discarded = discard_until_marker(src);
        if discarded > 0 {
            debug!(discarded, "skipped bytes before start marker");
        }

        let header = match Header::parse(src) {
            Some(header) => header,
            None => {
                src.reserve(HEADER_SIZE);
                return Ok(None);
            }
        };

        let frame_len = header.frame_len();
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(frame_len).freeze();
        Ok(Some(self.decoder.verify(frame)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let available = src.len();
        let header = Header::parse(src);
        let expected = header.map_or(HEADER_SIZE, |h| h.frame_len());
        src.clear();
        Ok(Some(Err(DecodeError::new(
            FrameError::Truncated {
                expected,
                available,
            },
            header.map(|h| h.to_packet()),
        ))))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode_one(&packet, dst)
    }
}

impl Encoder<&Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, packet: &Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode_one(packet, dst)
    }
}
