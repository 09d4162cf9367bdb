use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use mavwire_dialect::{builtin, Dialect, DialectRegistry};
use tracing::debug;

use crate::exit::{dialect_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod dialects;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive packets from a UDP or TCP link and print them.
    Listen(ListenArgs),
    /// Encode and send packets.
    Send(SendArgs),
    /// Decode a raw capture file and print a summary.
    Decode(DecodeArgs),
    /// List every resolvable message id.
    Dialects(DialectsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, dialects: &[String]) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format, build_registry(dialects)?),
        Command::Send(args) => send::run(args, build_registry(dialects)?),
        Command::Decode(args) => decode::run(args, format, build_registry(dialects)?),
        Command::Dialects(_) => dialects::run(format, build_registry(dialects)?),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (UDP) or connect to (TCP), e.g. 0.0.0.0:14550.
    pub addr: String,
    /// Connect over TCP instead of binding a UDP socket.
    #[arg(long)]
    pub tcp: bool,
    /// Print only these message ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub msg_ids: Option<Vec<u8>>,
    /// Exit after printing N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Give up when nothing arrives for this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Destination address, e.g. 127.0.0.1:14550.
    pub addr: String,
    /// Connect over TCP instead of sending UDP datagrams.
    #[arg(long)]
    pub tcp: bool,
    /// Message id to send.
    #[arg(long)]
    pub msg_id: u8,
    /// Payload as hex bytes.
    #[arg(long, default_value = "")]
    pub payload: String,
    /// Sender system id.
    #[arg(long, default_value = "255")]
    pub system_id: u8,
    /// Sender component id.
    #[arg(long, default_value = "190")]
    pub component_id: u8,
    /// Number of packets to send.
    #[arg(long, default_value = "1")]
    pub count: usize,
    /// Delay between packets (e.g. 1s, 100ms).
    #[arg(long)]
    pub interval: Option<String>,
    /// First sequence id.
    #[arg(long, default_value = "0")]
    pub sequence: u8,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode, or `-` for stdin.
    pub input: PathBuf,
    /// Exit with status 60 if any frame failed to decode.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug, Default)]
pub struct DialectsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Build the registry: the built-in `common` dialect, then each `--dialect` in
/// order. A value is a built-in dialect name or a path to a JSON document.
pub fn build_registry(names: &[String]) -> CliResult<Arc<DialectRegistry>> {
    let mut registry = DialectRegistry::default();
    for name in names {
        if name.eq_ignore_ascii_case(builtin::COMMON) {
            continue;
        }
        registry.register(load_dialect(name)?);
    }
    debug!(dialects = registry.len(), "dialect registry ready");
    Ok(Arc::new(registry))
}

fn load_dialect(name: &str) -> CliResult<Dialect> {
    if let Some(dialect) = builtin::by_name(name) {
        return Ok(dialect);
    }
    let path = Path::new(name);
    if !path.exists() {
        return Err(CliError::new(
            USAGE,
            format!(
                "unknown dialect {name:?}: not a built-in ({}) or an existing file",
                builtin::names().join(", ")
            ),
        ));
    }
    Dialect::from_file(path).map_err(|err| dialect_error(&format!("dialect {name}"), err))
}

pub(crate) fn resolve_addr(addr: &str) -> CliResult<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|err| CliError::new(USAGE, format!("invalid address {addr:?}: {err}")))?
        .next()
        .ok_or_else(|| CliError::new(USAGE, format!("address {addr:?} resolved to nothing")))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
