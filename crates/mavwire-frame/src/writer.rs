use std::io::{ErrorKind, Write};
use std::net::TcpStream;
use std::sync::Arc;

use bytes::BytesMut;
use mavwire_dialect::{Dialect, DialectRegistry};
use tracing::trace;

use crate::codec::{encode_packet, CodecConfig, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::packet::Packet;

/// Writes framed, checksummed packets to any `Write` stream.
///
/// The writer owns the outgoing sequence counter. Every frame goes out with the
/// writer's current sequence id, and the counter advances (modulo 256) only
/// after the whole frame has been written and flushed.
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
    registry: Arc<DialectRegistry>,
    sequence: u8,
    config: CodecConfig,
}

impl<T: Write> PacketWriter<T> {
    /// Create a writer with the default registry and configuration.
    pub fn new(inner: T) -> Self {
        Self::with_registry(inner, Arc::new(DialectRegistry::default()))
    }

    /// Create a writer resolving message ids against `registry`.
    pub fn with_registry(inner: T, registry: Arc<DialectRegistry>) -> Self {
        Self::with_config(inner, registry, CodecConfig::default())
    }

    /// Create a writer with explicit registry and configuration.
    pub fn with_config(inner: T, registry: Arc<DialectRegistry>, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
            registry,
            sequence: config.initial_sequence,
            config,
        }
    }

    /// Pack a message, stamp the sender identity and write it.
    pub fn encode<M: Message>(
        &mut self,
        system_id: u8,
        component_id: u8,
        message: &M,
    ) -> Result<()> {
        let packet = message.pack()?.with_source(system_id, component_id);
        self.encode_packet(&packet)
    }

    /// Write a complete frame (blocking).
    ///
    /// `packet.sequence` and `packet.checksum` are ignored. Nothing reaches the
    /// stream if the message id is unknown or the payload is too large.
    pub fn encode_packet(&mut self, packet: &Packet) -> Result<()> {
        self.buf.clear();
        encode_packet(packet, self.sequence, &self.registry, &mut self.buf)?;

        self.write_buffered()?;
        self.flush()?;

        trace!(
            sequence = self.sequence,
            message_id = packet.message_id,
            payload_len = packet.payload.len(),
            "encoded packet"
        );
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    fn write_buffered(&mut self) -> Result<()> {
        let expected = self.buf.len();
        let mut written = 0usize;
        while written < expected {
            match self.inner.write(&self.buf[written..]) {
                Ok(0) => return Err(FrameError::ShortWrite { written, expected }),
                Ok(n) => written += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Sequence id the next packet will carry.
    pub fn next_sequence(&self) -> u8 {
        self.sequence
    }

    pub fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    /// Append a dialect to this writer's resolution order.
    pub fn register_dialect(&mut self, dialect: impl Into<Arc<Dialect>>) {
        Arc::make_mut(&mut self.registry).register(dialect);
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl PacketWriter<TcpStream> {
    /// Create a writer for a TCP stream and apply the write timeout from config.
    pub fn with_config_tcp(
        inner: TcpStream,
        registry: Arc<DialectRegistry>,
        config: CodecConfig,
    ) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, registry, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};

    use bytes::Bytes;

    use super::*;
    use crate::codec::decode_packet;
    use crate::message::tests::Heartbeat;

    fn decode_all(wire: &[u8]) -> Vec<Packet> {
        let registry = DialectRegistry::default();
        let mut packets = Vec::new();
        let mut offset = 0;
        while offset < wire.len() {
            let packet = decode_packet(&wire[offset..], &registry).unwrap();
            offset += packet.wire_size();
            packets.push(packet);
        }
        packets
    }

    #[test]
    fn write_single_packet() {
        let mut writer = PacketWriter::new(Vec::new());
        writer
            .encode_packet(&Packet::new(0, Bytes::new()).with_source(1, 1))
            .unwrap();

        assert_eq!(
            writer.into_inner(),
            vec![0xFE, 0x00, 0x00, 0x01, 0x01, 0x00, 0x86, 0x5C]
        );
    }

    #[test]
    fn encode_message_stamps_source() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::new()));
        writer.encode(1, 1, &Heartbeat::rover()).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), 17);
        assert_eq!(&wire[..6], &[0xFE, 9, 0, 1, 1, 0]);
        assert_eq!(&wire[15..], &[0x7D, 0xDD]);
    }

    #[test]
    fn sequence_ignores_packet_field_and_wraps() {
        let config = CodecConfig {
            initial_sequence: 250,
            ..CodecConfig::default()
        };
        let mut writer =
            PacketWriter::with_config(Vec::new(), Arc::new(DialectRegistry::default()), config);

        for _ in 0..10 {
            let mut packet = Packet::new(0, Bytes::new());
            packet.sequence = 99;
            writer.encode_packet(&packet).unwrap();
        }
        assert_eq!(writer.next_sequence(), 4);

        let sequences: Vec<u8> = decode_all(&writer.into_inner())
            .iter()
            .map(|p| p.sequence)
            .collect();
        assert_eq!(sequences, vec![250, 251, 252, 253, 254, 255, 0, 1, 2, 3]);
    }

    #[test]
    fn roundtrip_preserves_fields() {
        let mut writer = PacketWriter::new(Vec::new());
        let sent = vec![
            Packet::new(0, Bytes::new()).with_source(1, 1),
            Packet::new(33, vec![0xFE; 28]).with_source(2, 190),
            Packet::new(253, vec![b'a'; 255]).with_source(255, 0),
        ];
        for packet in &sent {
            writer.encode_packet(packet).unwrap();
        }

        let received = decode_all(&writer.into_inner());
        assert_eq!(received.len(), sent.len());
        for (sent, received) in sent.iter().zip(&received) {
            assert_eq!(received.system_id, sent.system_id);
            assert_eq!(received.component_id, sent.component_id);
            assert_eq!(received.message_id, sent.message_id);
            assert_eq!(received.payload, sent.payload);
        }
    }

    #[test]
    fn unknown_message_writes_nothing_and_keeps_sequence() {
        let mut writer = PacketWriter::new(Vec::new());
        let err = writer
            .encode_packet(&Packet::new(3, b"nope".to_vec()))
            .unwrap_err();

        assert!(matches!(err, FrameError::UnknownMessage(3)));
        assert_eq!(writer.next_sequence(), 0);
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn payload_too_large_rejected() {
        let mut writer = PacketWriter::new(Vec::new());
        let err = writer
            .encode_packet(&Packet::new(0, vec![0u8; 300]))
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 300, .. }));
        assert_eq!(writer.next_sequence(), 0);
    }

    #[test]
    fn registered_dialect_allows_custom_ids() {
        let mut writer = PacketWriter::new(Vec::new());
        writer.register_dialect(Dialect::from_static("custom", &[(3, "CUSTOM", 9)]));
        writer.encode_packet(&Packet::new(3, b"ok".to_vec())).unwrap();
        assert_eq!(writer.registry().lookup(3).unwrap(), 9);
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = PacketWriter::new(sink);

        writer.encode_packet(&Packet::new(0, Bytes::new())).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = PacketWriter::new(writer_impl);
        writer.encode_packet(&Packet::new(0, Bytes::new())).unwrap();

        assert_eq!(writer.next_sequence(), 1);
        assert_eq!(writer.into_inner().data.len(), 8);
    }

    #[test]
    fn partial_writes_are_completed() {
        let mut writer = PacketWriter::new(TwoBytesAtATime { data: Vec::new() });
        writer.encode(7, 8, &Heartbeat::rover()).unwrap();

        let wire = writer.into_inner().data;
        let packet = decode_packet(&wire, &DialectRegistry::default()).unwrap();
        assert_eq!(packet.unpack::<Heartbeat>().unwrap(), Heartbeat::rover());
    }

    #[test]
    fn short_write_when_sink_stops_accepting() {
        let mut writer = PacketWriter::new(StopsAfter {
            limit: 5,
            data: Vec::new(),
        });
        let err = writer
            .encode_packet(&Packet::new(0, Bytes::new()))
            .unwrap_err();

        assert!(matches!(
            err,
            FrameError::ShortWrite {
                written: 5,
                expected: 8
            }
        ));
        assert_eq!(writer.next_sequence(), 0);
    }

    #[test]
    fn io_errors_propagate_verbatim() {
        let mut writer = PacketWriter::new(FailingWriter);
        let err = writer
            .encode_packet(&Packet::new(0, Bytes::new()))
            .unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(writer.next_sequence(), 0);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        assert!(writer.config().write_timeout.is_none());
        let _inner = writer.into_inner();
    }

    #[test]
    fn applies_write_timeout_for_tcp_stream() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let config = CodecConfig {
            write_timeout: Some(std::time::Duration::from_millis(50)),
            ..CodecConfig::default()
        };

        let writer =
            PacketWriter::with_config_tcp(stream, Arc::new(DialectRegistry::default()), config)
                .unwrap();
        // The kernel rounds socket timeouts up to its tick.
        let applied = writer.get_ref().write_timeout().unwrap().unwrap();
        assert!(applied >= std::time::Duration::from_millis(50));
        assert!(applied < std::time::Duration::from_secs(1));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct TwoBytesAtATime {
        data: Vec<u8>,
    }

    impl Write for TwoBytesAtATime {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(2);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct StopsAfter {
        limit: usize,
        data: Vec<u8>,
    }

    impl Write for StopsAfter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = (self.limit - self.data.len()).min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
