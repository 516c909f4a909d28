use clap::{Args, Subcommand};
use std::path::PathBuf;

use pinglink_schema::{compile, MessageGroup, SchemaTable};

use crate::exit::{schema_error, CliResult};
use crate::output::OutputFormat;

pub mod encode;
pub mod ping;
pub mod schema;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the compiled message layouts.
    Schema(SchemaArgs),
    /// Build a command packet and print it.
    Encode(EncodeArgs),
    /// Configure a device, stream profiles and print distances.
    Ping(PingArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Schema(args) => schema::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Ping(args) => ping::run(args, format),
    }
}

#[derive(Args, Debug, Default)]
pub struct DefinitionArgs {
    /// Extra definition documents to load after the built-in ones.
    #[arg(long = "definitions", value_name = "FILE")]
    pub definitions: Vec<PathBuf>,
}

impl DefinitionArgs {
    /// Built-in definitions plus any extra documents, compiled.
    pub fn load_table(&self) -> CliResult<SchemaTable> {
        let mut description = pinglink_schema::definitions::builtin()
            .map_err(|err| schema_error("built-in definitions", err))?;
        for path in &self.definitions {
            let group = MessageGroup::from_definition_file(path)
                .map_err(|err| schema_error(&format!("loading {}", path.display()), err))?;
            description.groups.push(group);
        }
        compile(&description).map_err(|err| schema_error("compiling definitions", err))
    }
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub definitions: DefinitionArgs,
    /// Only show these message ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<u16>>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub definitions: DefinitionArgs,
    /// Message id or name.
    pub message: String,
    /// Field values in layout order. Integers are decimal or 0x-prefixed,
    /// char fields take one ASCII character, byte arrays take hex.
    #[arg(allow_hyphen_values = true)]
    pub values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Device address: unix:PATH, tcp:HOST:PORT, HOST:PORT or a socket path.
    #[arg(env = "PINGLINK_DEVICE")]
    pub device: String,
    /// Start of the scan window (mm).
    #[arg(long, default_value_t = 500)]
    pub scan_start: u32,
    /// Length of the scan window (mm).
    #[arg(long, default_value_t = 2000)]
    pub scan_length: u32,
    /// Stop after this many profiles. Default: until interrupted.
    #[arg(long)]
    pub count: Option<usize>,
    /// Gain setting index.
    #[arg(long, default_value_t = 6)]
    pub gain: u8,
    /// Speed of sound (mm/s).
    #[arg(long, default_value_t = 343_000)]
    pub speed_of_sound: u32,
    /// Interval between pings (ms).
    #[arg(long, default_value_t = 250)]
    pub ping_interval: u16,
    /// Give up when no profile arrives for this long (e.g. 5s, 500ms).
    #[arg(long, env = "PINGLINK_TIMEOUT", default_value = "5s")]
    pub timeout: String,
}
