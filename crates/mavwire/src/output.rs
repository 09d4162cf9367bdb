use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mavwire_dialect::DialectRegistry;
use mavwire_frame::Packet;
use serde::Serialize;

use crate::stats::LinkStats;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    kind: &'static str,
    sequence: u8,
    system_id: u8,
    component_id: u8,
    message_id: u8,
    message_name: &'a str,
    payload_len: usize,
    payload: String,
    checksum: String,
    timestamp: String,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    kind: &'static str,
    #[serde(flatten)]
    stats: &'a LinkStats,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    id: u8,
    name: &'a str,
    crc_extra: u8,
    dialect: &'a str,
}

pub fn print_packet(packet: &Packet, registry: &DialectRegistry, format: OutputFormat) {
    let name = message_name(registry, packet.message_id);
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                kind: "packet",
                sequence: packet.sequence,
                system_id: packet.system_id,
                component_id: packet.component_id,
                message_id: packet.message_id,
                message_name: name,
                payload_len: packet.payload.len(),
                payload: hex::encode(&packet.payload),
                checksum: format!("{:04x}", packet.checksum),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "SOURCE", "MSG", "LEN", "PAYLOAD"])
                .add_row(vec![
                    packet.sequence.to_string(),
                    format!("{}/{}", packet.system_id, packet.component_id),
                    format!("{} ({})", name, packet.message_id),
                    packet.payload.len().to_string(),
                    hex::encode(&packet.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "seq={} src={}/{} msg={} ({}) len={} payload={}",
                packet.sequence,
                packet.system_id,
                packet.component_id,
                name,
                packet.message_id,
                packet.payload.len(),
                hex::encode(&packet.payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(packet.payload.as_ref());
        }
    }
}

pub fn print_summary(stats: &LinkStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SummaryOutput {
            kind: "summary",
            stats,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DECODED", "BAD CRC", "UNKNOWN", "TRUNCATED", "LOST"])
                .add_row(vec![
                    stats.decoded.to_string(),
                    stats.checksum_failures.to_string(),
                    stats.unknown_ids.to_string(),
                    stats.truncated.to_string(),
                    stats.lost.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "decoded={} bad_crc={} unknown={} truncated={} lost={}",
                stats.decoded,
                stats.checksum_failures,
                stats.unknown_ids,
                stats.truncated,
                stats.lost
            );
        }
        // Raw output carries payload bytes only.
        OutputFormat::Raw => {}
    }
}

pub fn print_dialects(registry: &DialectRegistry, format: OutputFormat) {
    let messages = registry.messages();
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out: Vec<MessageOutput<'_>> = messages
                .iter()
                .map(|(dialect, info)| MessageOutput {
                    id: info.id,
                    name: &info.name,
                    crc_extra: info.crc_extra,
                    dialect: dialect.name(),
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "CRC EXTRA", "DIALECT"]);
            for (dialect, info) in &messages {
                table.add_row(vec![
                    info.id.to_string(),
                    info.name.clone(),
                    info.crc_extra.to_string(),
                    dialect.name().to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (dialect, info) in &messages {
                println!(
                    "{:>3} {:<32} crc_extra={:<3} dialect={}",
                    info.id,
                    info.name,
                    info.crc_extra,
                    dialect.name()
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn message_name(registry: &DialectRegistry, message_id: u8) -> &str {
    registry
        .resolve(message_id)
        .map(|info| info.name.as_str())
        .unwrap_or("UNKNOWN")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
