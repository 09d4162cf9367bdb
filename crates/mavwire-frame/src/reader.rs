use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use mavwire_dialect::{Dialect, DialectRegistry};
use tracing::debug;

use crate::codec::{
    decode_packet, discard_until_marker, verify_frame, CodecConfig, Header, HEADER_SIZE,
    MAX_FRAME_SIZE,
};
use crate::error::{DecodeError, DecodeResult, FrameError, Result};
use crate::packet::Packet;

const INITIAL_BUFFER_CAPACITY: usize = 2 * MAX_FRAME_SIZE;
const READ_CHUNK_SIZE: usize = 1024;

/// Verifies frames against a dialect registry and tracks the last sequence id.
///
/// Use this directly for pre-delimited datagrams; [`PacketReader`] wraps one
/// for byte streams.
#[derive(Debug, Clone)]
pub struct PacketDecoder {
    registry: Arc<DialectRegistry>,
    last_sequence: u8,
}

impl PacketDecoder {
    /// Create a decoder backed by the default registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(DialectRegistry::default()))
    }

    pub fn with_registry(registry: Arc<DialectRegistry>) -> Self {
        Self {
            registry,
            last_sequence: 0,
        }
    }

    /// Decode a buffer holding exactly one frame starting at offset 0.
    ///
    /// See [`decode_packet`] for the validation rules.
    pub fn decode_from_buffer(&mut self, src: &[u8]) -> DecodeResult<Packet> {
        let packet = decode_packet(src, &self.registry)?;
        self.last_sequence = packet.sequence;
        Ok(packet)
    }

    pub(crate) fn verify(&mut self, frame: Bytes) -> DecodeResult<Packet> {
        let packet = verify_frame(frame, &self.registry)?;
        self.last_sequence = packet.sequence;
        Ok(packet)
    }

    /// Sequence id of the last successfully decoded packet.
    pub fn last_sequence(&self) -> u8 {
        self.last_sequence
    }

    pub fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    /// Append a dialect to this decoder's resolution order.
    ///
    /// A registry shared with other decoders or writers is copied first, so
    /// they are unaffected.
    pub fn register_dialect(&mut self, dialect: impl Into<Arc<Dialect>>) {
        Arc::make_mut(&mut self.registry).register(dialect);
    }
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads verified packets from any `Read` stream.
///
/// Leading garbage is skipped up to the next start marker. A frame's bytes are
/// consumed once it is complete, whether or not it verifies, so the next call
/// starts after it. If the stream fails part-way through a frame the partial
/// bytes stay buffered and the next call retries from the same marker.
pub struct PacketReader<T> {
    inner: T,
    buf: BytesMut,
    decoder: PacketDecoder,
    config: CodecConfig,
}

impl<T: Read> PacketReader<T> {
    /// Create a reader with the default registry and configuration.
    pub fn new(inner: T) -> Self {
        Self::with_registry(inner, Arc::new(DialectRegistry::default()))
    }

    /// Create a reader resolving message ids against `registry`.
    pub fn with_registry(inner: T, registry: Arc<DialectRegistry>) -> Self {
        Self::with_config(inner, registry, CodecConfig::default())
    }

    /// Create a reader with explicit registry and configuration.
    pub fn with_config(inner: T, registry: Arc<DialectRegistry>, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            decoder: PacketDecoder::with_registry(registry),
            config,
        }
    }

    /// Read and verify the next packet (blocking).
    ///
    /// Returns [`FrameError::EndOfStream`] when the stream ends before a start
    /// marker, and [`FrameError::Truncated`] when it ends inside a frame.
    pub fn decode(&mut self) -> DecodeResult<Packet> {
        self.seek_start_marker()?;

        self.fill_to(HEADER_SIZE, None)?;
        let header = match Header::parse(&self.buf) {
            Some(header) => header,
            None => return Err(FrameError::InvalidHeader("missing start marker").into()),
        };

        let frame_len = header.frame_len();
        self.fill_to(frame_len, Some(&header))?;

        let frame = self.buf.split_to(frame_len).freeze();
        self.decoder.verify(frame)
    }

    /// Decode a pre-delimited buffer, bypassing the stream.
    pub fn decode_from_buffer(&mut self, src: &[u8]) -> DecodeResult<Packet> {
        self.decoder.decode_from_buffer(src)
    }

    fn seek_start_marker(&mut self) -> Result<()> {
        let mut discarded = 0usize;
        loop {
            discarded += discard_until_marker(&mut self.buf);
            if !self.buf.is_empty() {
                break;
            }
            if self.fill()? == 0 {
                if discarded > 0 {
                    debug!(discarded, "stream ended while seeking start marker");
                }
                return Err(FrameError::EndOfStream);
            }
        }
        if discarded > 0 {
            debug!(discarded, "skipped bytes before start marker");
        }
        Ok(())
    }

    fn fill_to(&mut self, len: usize, header: Option<&Header>) -> DecodeResult<()> {
        while self.buf.len() < len {
            match self.fill() {
                Ok(0) => {
                    let available = self.buf.len();
                    self.buf.clear();
                    return Err(DecodeError::new(
                        FrameError::Truncated {
                            expected: len,
                            available,
                        },
                        header.map(Header::to_packet),
                    ));
                }
                Ok(_) => {}
                Err(err) => return Err(DecodeError::new(err, header.map(Header::to_packet))),
            }
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Sequence id of the last successfully decoded packet.
    pub fn last_sequence(&self) -> u8 {
        self.decoder.last_sequence()
    }

    pub fn registry(&self) -> &DialectRegistry {
        self.decoder.registry()
    }

    /// Append a dialect to this reader's resolution order.
    pub fn register_dialect(&mut self, dialect: impl Into<Arc<Dialect>>) {
        self.decoder.register_dialect(dialect);
    }

    /// Number of bytes read from the stream but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl PacketReader<TcpStream> {
    /// Create a reader for a TCP stream and apply the read timeout from config.
    pub fn with_config_tcp(
        inner: TcpStream,
        registry: Arc<DialectRegistry>,
        config: CodecConfig,
    ) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, registry, config))
    }
}
