use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use mavwire_dialect::DialectRegistry;
use mavwire_frame::{FrameError, Packet, PacketReader};
use tracing::{debug, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_packet, print_summary, OutputFormat};
use crate::stats::LinkStats;

pub fn run(
    args: DecodeArgs,
    format: OutputFormat,
    registry: Arc<DialectRegistry>,
) -> CliResult<i32> {
    let input: Box<dyn Read> = if args.input == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input).map_err(|err| {
            io_error(&format!("failed opening {}", args.input.display()), err)
        })?;
        Box::new(file)
    };

    let stats = decode_stream(input, registry, |packet, registry| {
        print_packet(packet, registry, format)
    })?;
    print_summary(&stats, format);

    if args.strict && stats.errors() > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

/// Decode every frame in `input`, handing verified packets to `on_packet`.
fn decode_stream<R, F>(
    input: R,
    registry: Arc<DialectRegistry>,
    mut on_packet: F,
) -> CliResult<LinkStats>
where
    R: Read,
    F: FnMut(&Packet, &DialectRegistry),
{
    let mut reader = PacketReader::with_registry(input, registry);
    let mut stats = LinkStats::default();

    loop {
        match reader.decode() {
            Ok(packet) => {
                let lost = stats.record_packet(&packet);
                if lost > 0 {
                    debug!(sequence = packet.sequence, lost, "sequence gap");
                }
                on_packet(&packet, reader.registry());
            }
            Err(err) if matches!(err.kind(), FrameError::EndOfStream) => break,
            Err(err) if matches!(err.kind(), FrameError::Io(_)) => {
                return Err(frame_error("read failed", err.into()));
            }
            Err(err) => {
                warn!(error = %err, "dropped frame");
                stats.record_error(&err);
            }
        }
    }

    Ok(stats)
}
