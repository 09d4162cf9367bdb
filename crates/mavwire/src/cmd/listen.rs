use std::io;
use std::net::{TcpStream, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mavwire_dialect::DialectRegistry;
use mavwire_frame::{decode_packet, CodecConfig, DecodeError, FrameError, Packet, PacketReader};
use tracing::{info, trace, warn};

use crate::cmd::{parse_duration, resolve_addr, ListenArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_packet, print_summary, OutputFormat};
use crate::stats::LinkStats;

const DATAGRAM_BUFFER_SIZE: usize = 64 * 1024;

/// Upper bound on a blocking receive, so Ctrl-C is noticed without traffic.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(
    args: ListenArgs,
    format: OutputFormat,
    registry: Arc<DialectRegistry>,
) -> CliResult<i32> {
    let timeout = args.timeout.as_deref().map(parse_duration).transpose()?;
    let addr = resolve_addr(&args.addr)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut session = Session {
        args: &args,
        format,
        registry: &registry,
        stats: LinkStats::default(),
        printed: 0,
    };
    let mut idle = IdleClock::new(timeout);
    let mut timed_out = false;

    if args.tcp {
        let stream = TcpStream::connect(addr).map_err(|err| io_error("connect failed", err))?;
        info!(%addr, "connected");
        let config = CodecConfig {
            read_timeout: Some(poll_interval(timeout)),
            ..CodecConfig::default()
        };
        let mut reader = PacketReader::with_config_tcp(stream, registry.clone(), config)
            .map_err(|err| frame_error("configure stream failed", err))?;

        while running.load(Ordering::SeqCst) && !session.done() {
            match reader.decode() {
                Ok(packet) => {
                    idle.touch();
                    session.accept(&packet);
                }
                Err(err) if matches!(err.kind(), FrameError::EndOfStream) => {
                    info!("link closed");
                    break;
                }
                Err(err) if matches!(err.kind(), FrameError::Io(e) if is_timeout(e)) => {
                    if idle.expired() {
                        timed_out = true;
                        break;
                    }
                }
                Err(err) if matches!(err.kind(), FrameError::Io(_)) => {
                    return Err(frame_error("receive failed", err.into()));
                }
                Err(err) => {
                    idle.touch();
                    session.reject(&err);
                }
            }
        }
    } else {
        let socket = UdpSocket::bind(addr).map_err(|err| io_error("bind failed", err))?;
        socket
            .set_read_timeout(Some(poll_interval(timeout)))
            .map_err(|err| io_error("configure socket failed", err))?;
        info!(%addr, "listening");

        let mut datagram = vec![0u8; DATAGRAM_BUFFER_SIZE];
        while running.load(Ordering::SeqCst) && !session.done() {
            let (len, peer) = match socket.recv_from(&mut datagram) {
                Ok(received) => received,
                Err(err) if is_timeout(&err) => {
                    if idle.expired() {
                        timed_out = true;
                        break;
                    }
                    continue;
                }
                Err(err) => return Err(io_error("receive failed", err)),
            };
            trace!(%peer, len, "datagram");
            idle.touch();
            session.datagram(&datagram[..len]);
        }
    }

    print_summary(&session.stats, format);
    if timed_out {
        warn!(timeout = ?idle.limit, "no traffic before timeout");
        return Ok(TIMEOUT);
    }
    Ok(SUCCESS)
}

/// Time since the last frame, measured against `--timeout`.
struct IdleClock {
    limit: Option<Duration>,
    last: Instant,
}

impl IdleClock {
    fn new(limit: Option<Duration>) -> Self {
        Self {
            limit,
            last: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last = Instant::now();
    }

    fn expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.last.elapsed() >= limit)
    }
}

fn poll_interval(timeout: Option<Duration>) -> Duration {
    timeout.map_or(POLL_INTERVAL, |limit| limit.min(POLL_INTERVAL))
}

// Read timeouts surface as WouldBlock on Unix and TimedOut on Windows.
fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

struct Session<'a> {
    args: &'a ListenArgs,
    format: OutputFormat,
    registry: &'a DialectRegistry,
    stats: LinkStats,
    printed: usize,
}

impl Session<'_> {
    fn done(&self) -> bool {
        self.args.count.is_some_and(|count| self.printed >= count)
    }

    fn accept(&mut self, packet: &Packet) {
        let lost = self.stats.record_packet(packet);
        if lost > 0 {
            warn!(
                system_id = packet.system_id,
                component_id = packet.component_id,
                sequence = packet.sequence,
                lost,
                "sequence gap"
            );
        }

        if let Some(ids) = &self.args.msg_ids {
            if !ids.contains(&packet.message_id) {
                return;
            }
        }
        if self.done() {
            return;
        }
        print_packet(packet, self.registry, self.format);
        self.printed = self.printed.saturating_add(1);
    }

    fn reject(&mut self, err: &DecodeError) {
        self.stats.record_error(err);
        match err.packet() {
            Some(packet) => warn!(
                message_id = packet.message_id,
                sequence = packet.sequence,
                error = %err,
                "dropped frame"
            ),
            None => warn!(error = %err, "dropped frame"),
        }
    }

    /// Decode every frame packed into one datagram.
    fn datagram(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            match decode_packet(data, self.registry) {
                Ok(packet) => {
                    data = &data[packet.wire_size()..];
                    self.accept(&packet);
                }
                Err(err) => {
                    self.reject(&err);
                    match (err.kind(), err.packet()) {
                        (
                            FrameError::ChecksumMismatch { .. } | FrameError::UnknownMessage(_),
                            Some(packet),
                        ) => data = &data[packet.wire_size()..],
                        _ => break,
                    }
                }
            }
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
