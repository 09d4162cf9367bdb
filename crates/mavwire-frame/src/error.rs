use mavwire_dialect::DialectError;

use crate::packet::Packet;

/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte source ended while searching for a start marker.
    #[error("end of stream")]
    EndOfStream,

    /// Fewer bytes were available than the frame header declares.
    #[error("truncated frame ({available} of {expected} bytes)")]
    Truncated { expected: usize, available: usize },

    /// A datagram does not start with a valid frame header.
    #[error("invalid frame header: {0}")]
    InvalidHeader(&'static str),

    /// No registered dialect defines the message id.
    #[error("unknown message id {0}")]
    UnknownMessage(u8),

    /// The transmitted checksum disagrees with the computed one.
    #[error("checksum mismatch (received {received:#06x}, computed {computed:#06x})")]
    ChecksumMismatch { received: u16, computed: u16 },

    /// The sink accepted fewer bytes than the frame holds.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The payload does not fit the single-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A packet was unpacked as the wrong message type.
    #[error("message id mismatch (expected {expected}, got {actual})")]
    MessageMismatch { expected: u8, actual: u8 },

    /// A message could not be packed into or unpacked from a payload.
    #[error("invalid payload for message {message_id}: {reason}")]
    InvalidPayload { message_id: u8, reason: String },

    /// A dialect could not be loaded or built.
    #[error(transparent)]
    Dialect(DialectError),

    /// An I/O error occurred on the underlying stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DialectError> for FrameError {
    fn from(err: DialectError) -> Self {
        match err {
            DialectError::UnknownMessage(id) => FrameError::UnknownMessage(id),
            other => FrameError::Dialect(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// A decode failure together with whatever part of the packet was parsed.
///
/// The partial packet is diagnostic data only. Which fields it carries depends
/// on how far decoding got: a truncated frame has header fields but no payload,
/// an unknown message or checksum mismatch has header, payload and the
/// transmitted checksum.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct DecodeError {
    #[source]
    error: FrameError,
    packet: Option<Packet>,
}

impl DecodeError {
    pub fn new(error: FrameError, packet: Option<Packet>) -> Self {
        Self { error, packet }
    }

    /// The underlying failure.
    pub fn kind(&self) -> &FrameError {
        &self.error
    }

    /// The partially decoded packet, if the header was read.
    pub fn packet(&self) -> Option<&Packet> {
        self.packet.as_ref()
    }

    pub fn into_parts(self) -> (FrameError, Option<Packet>) {
        (self.error, self.packet)
    }

    /// Whether the stream is still usable after this failure.
    ///
    /// Corrupt or unknown frames are dropped and the next decode resynchronizes.
    /// I/O failures, truncation and end of stream usually end the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.error,
            FrameError::ChecksumMismatch { .. }
                | FrameError::UnknownMessage(_)
                | FrameError::InvalidHeader(_)
        )
    }
}

impl From<FrameError> for DecodeError {
    fn from(error: FrameError) -> Self {
        Self::new(error, None)
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        Self::new(FrameError::Io(err), None)
    }
}

impl From<DecodeError> for FrameError {
    fn from(err: DecodeError) -> Self {
        err.error
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
