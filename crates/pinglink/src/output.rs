use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pinglink_device::ProfileReport;
use pinglink_schema::MessageLayout;
use serde::Serialize;

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
struct FieldOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_tag: &'static str,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    id: u16,
    name: &'a str,
    group: &'a str,
    fixed_size: usize,
    variable_tail: bool,
    fields: Vec<FieldOutput<'a>>,
}

pub fn print_layouts(layouts: &[&Arc<MessageLayout>], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<MessageOutput<'_>> = layouts
                .iter()
                .map(|layout| MessageOutput {
                    id: layout.id(),
                    name: layout.name(),
                    group: layout.group(),
                    fixed_size: layout.fixed_size(),
                    variable_tail: layout.has_variable_tail(),
                    fields: layout
                        .fields()
                        .iter()
                        .map(|f| FieldOutput {
                            name: &f.name,
                            type_tag: f.field_type.tag(),
                        })
                        .collect(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "GROUP", "SIZE", "FIELDS"]);
            for layout in layouts {
                table.add_row(vec![
                    layout.id().to_string(),
                    layout.name().to_string(),
                    layout.group().to_string(),
                    size_label(layout),
                    field_summary(layout),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for layout in layouts {
                println!(
                    "{:>5} {} ({}) size={} [{}]",
                    layout.id(),
                    layout.name(),
                    layout.group(),
                    size_label(layout),
                    field_summary(layout)
                );
            }
        }
    }
}

fn size_label(layout: &MessageLayout) -> String {
    if layout.has_variable_tail() {
        format!("{}+", layout.fixed_size())
    } else {
        layout.fixed_size().to_string()
    }
}

fn field_summary(layout: &MessageLayout) -> String {
    layout
        .fields()
        .iter()
        .map(|f| format!("{}:{}", f.name, f.field_type))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    message_id: u16,
    name: &'a str,
    size: usize,
    packet: String,
}

pub fn print_packet(message_id: u16, name: &str, packet: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                message_id,
                name,
                size: packet.len(),
                packet: hex::encode(packet),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "SIZE", "PACKET"])
                .add_row(vec![
                    message_id.to_string(),
                    name.to_string(),
                    packet.len().to_string(),
                    hex::encode(packet),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", hex::encode(packet)),
        OutputFormat::Raw => print_raw(packet),
    }
}

#[derive(Serialize)]
struct ProfileOutput {
    ping_number: u32,
    distance: u32,
    confidence: u16,
    transmit_duration: u16,
    scan_start: u32,
    scan_length: u32,
    gain_setting: u32,
    samples: usize,
    timestamp: String,
}

pub fn print_profile(report: &ProfileReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ProfileOutput {
                ping_number: report.ping_number,
                distance: report.distance,
                confidence: report.confidence,
                transmit_duration: report.transmit_duration,
                scan_start: report.scan_start,
                scan_length: report.scan_length,
                gain_setting: report.gain_setting,
                samples: report.profile_data.len(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PING", "DISTANCE (mm)", "CONFIDENCE (%)", "SCAN (mm)"])
                .add_row(vec![
                    report.ping_number.to_string(),
                    report.distance.to_string(),
                    report.confidence.to_string(),
                    format!(
                        "{}..{}",
                        report.scan_start,
                        report.scan_start.saturating_add(report.scan_length)
                    ),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", report.distance),
        OutputFormat::Raw => print_raw(&report.profile_data),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
