mod cmd;
mod exit;
mod logging;
mod output;
mod stats;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mavwire", version, about = "MAVLink 1.0 link inspection CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Extra dialect to register after `common`: a built-in name or a JSON file.
    #[arg(long = "dialect", value_name = "NAME|PATH", global = true)]
    dialects: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format, &cli.dialects);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "mavwire",
            "send",
            "127.0.0.1:14550",
            "--msg-id",
            "0",
            "--payload",
            "000000000203510403",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.msg_id, 0);
                assert_eq!(args.system_id, 255);
                assert_eq!(args.count, 1);
                assert!(!args.tcp);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn send_requires_message_id() {
        let err = Cli::try_parse_from(["mavwire", "send", "127.0.0.1:14550"])
            .expect_err("missing --msg-id should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn dialect_flag_is_global_and_repeatable() {
        let cli = Cli::try_parse_from([
            "mavwire",
            "listen",
            "0.0.0.0:14550",
            "--dialect",
            "ardupilotmega",
            "--dialect",
            "extra.json",
            "--msg-ids",
            "0,33",
        ])
        .expect("listen args should parse");

        assert_eq!(cli.dialects, vec!["ardupilotmega", "extra.json"]);
        match cli.command {
            Command::Listen(args) => assert_eq!(args.msg_ids, Some(vec![0, 33])),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_message_id() {
        let err = Cli::try_parse_from(["mavwire", "send", "127.0.0.1:1", "--msg-id", "256"])
            .expect_err("message id must fit in a byte");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
