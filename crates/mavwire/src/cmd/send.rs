use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::sync::Arc;
use std::thread;

use mavwire_dialect::DialectRegistry;
use mavwire_frame::{CodecConfig, Packet, PacketWriter};
use tracing::info;

use crate::cmd::{parse_duration, resolve_addr, SendArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};

/// `Write` adapter that sends each write as one datagram.
struct DatagramSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl Write for DatagramSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send_to(buf, self.target)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn run(args: SendArgs, registry: Arc<DialectRegistry>) -> CliResult<i32> {
    let payload = parse_payload(&args.payload)?;
    let interval = args.interval.as_deref().map(parse_duration).transpose()?;
    let addr = resolve_addr(&args.addr)?;
    let config = CodecConfig {
        initial_sequence: args.sequence,
        ..CodecConfig::default()
    };
    let packet = Packet::new(args.msg_id, payload).with_source(args.system_id, args.component_id);

    if args.tcp {
        let stream = TcpStream::connect(addr).map_err(|err| io_error("connect failed", err))?;
        let mut writer = PacketWriter::with_config_tcp(stream, registry, config)
            .map_err(|err| frame_error("configure stream failed", err))?;
        send_all(&mut writer, &packet, &args, interval)?;
    } else {
        let local: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(|err| io_error("bind failed", err))?;
        let sink = DatagramSink {
            socket,
            target: addr,
        };
        let mut writer = PacketWriter::with_config(sink, registry, config);
        send_all(&mut writer, &packet, &args, interval)?;
    }

    info!(
        %addr,
        count = args.count,
        message_id = args.msg_id,
        "sent packets"
    );
    Ok(SUCCESS)
}

fn send_all<W: Write>(
    writer: &mut PacketWriter<W>,
    packet: &Packet,
    args: &SendArgs,
    interval: Option<std::time::Duration>,
) -> CliResult<()> {
    for index in 0..args.count {
        if index > 0 {
            if let Some(interval) = interval {
                thread::sleep(interval);
            }
        }
        writer
            .encode_packet(packet)
            .map_err(|err| frame_error("send failed", err))?;
    }
    Ok(())
}

fn parse_payload(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != ':')
        .collect();
    let cleaned = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    hex::decode(cleaned)
        .map_err(|err| CliError::new(USAGE, format!("--payload is not valid hex: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_accepts_common_hex_spellings() {
        assert_eq!(parse_payload("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_payload("0102ff").unwrap(), vec![1, 2, 0xFF]);
        assert_eq!(parse_payload("0x0A0b").unwrap(), vec![0x0A, 0x0B]);
        assert_eq!(parse_payload("01:02 03").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn payload_rejects_bad_hex() {
        assert_eq!(parse_payload("abc").unwrap_err().code, USAGE);
        assert_eq!(parse_payload("zz").unwrap_err().code, USAGE);
    }

    #[test]
    fn datagram_sink_sends_one_frame_per_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(2)))
            .unwrap();
        let sink = DatagramSink {
            socket: UdpSocket::bind("127.0.0.1:0").unwrap(),
            target: receiver.local_addr().unwrap(),
        };
        let mut writer = PacketWriter::new(sink);
        writer.encode_packet(&Packet::new(0, Vec::<u8>::new())).unwrap();
        writer
            .encode_packet(&Packet::new(0, Vec::<u8>::new()).with_source(1, 1))
            .unwrap();

        let mut buf = [0u8; 64];
        let (first, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(first, 8);
        let (second, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..second], &[0xFE, 0x00, 0x01, 0x01, 0x01, 0x00, 0xC2, 0x57]);
    }
}
