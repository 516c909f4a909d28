use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use pinglink_device::{CommandBuilder, Link, LinkConfig, LinkEvent};
use pinglink_frame::ids;
use pinglink_schema::SchemaTable;
use pinglink_transport::LinkStream;

use crate::cmd::PingArgs;
use crate::exit::{
    command_error, device_error, schema_error, transport_error, CliError, CliResult, FAILURE,
    SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{print_profile, OutputFormat};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Where the device is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeviceAddress {
    Unix(PathBuf),
    Tcp(String),
}

impl DeviceAddress {
    fn parse(input: &str) -> CliResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CliError::new(USAGE, "device address must not be empty"));
        }
        if let Some(path) = input.strip_prefix("unix:") {
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = input.strip_prefix("tcp:") {
            return Ok(Self::Tcp(addr.to_string()));
        }
        if input.contains('/') {
            return Ok(Self::Unix(PathBuf::from(input)));
        }
        if input.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) {
            return Ok(Self::Tcp(input.to_string()));
        }
        Err(CliError::new(
            USAGE,
            format!("cannot tell whether '{input}' is a socket path or host:port"),
        ))
    }

    fn connect(&self) -> CliResult<LinkStream> {
        let stream = match self {
            #[cfg(unix)]
            Self::Unix(path) => LinkStream::connect_unix(path),
            #[cfg(not(unix))]
            Self::Unix(path) => {
                return Err(CliError::new(
                    USAGE,
                    format!("unix sockets are not supported here: {}", path.display()),
                ))
            }
            Self::Tcp(addr) => LinkStream::connect_tcp(addr.as_str(), CONNECT_TIMEOUT),
        };
        stream.map_err(|err| transport_error("connect failed", err))
    }
}

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;

    let address = DeviceAddress::parse(&args.device)?;
    let table = Arc::new(
        SchemaTable::builtin().map_err(|err| schema_error("built-in definitions", err))?,
    );
    let stream = address.connect()?;
    tracing::info!(device = %args.device, "connected");

    let mut link = Link::open(stream, table, LinkConfig::default())
        .map_err(|err| device_error("link failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    for packet in setup_sequence(link.commands(), &args)? {
        link.send_packet(&packet)
            .map_err(|err| device_error("send failed", err))?;
    }

    let result = print_profiles(&link, &running, args.count, timeout, format);

    let stop = link
        .commands()
        .continuous_stop(ids::PROFILE)
        .map_err(|err| command_error("encode failed", err))?;
    if let Err(err) = link.send_packet(&stop) {
        tracing::warn!(error = %err, "failed to stop continuous profile");
    }
    link.stop().map_err(|err| device_error("stop failed", err))?;

    result
}

/// Commands sent before streaming starts.
fn setup_sequence(commands: &CommandBuilder, args: &PingArgs) -> CliResult<Vec<Bytes>> {
    let err = |err| command_error("encode failed", err);
    Ok(vec![
        commands.request_protocol_version().map_err(err)?,
        commands.set_gain_setting(args.gain).map_err(err)?,
        commands.set_mode_auto(false).map_err(err)?,
        commands
            .set_range(args.scan_start, args.scan_length)
            .map_err(err)?,
        commands.set_speed_of_sound(args.speed_of_sound).map_err(err)?,
        commands.set_ping_interval(args.ping_interval).map_err(err)?,
        commands.continuous_start(ids::PROFILE).map_err(err)?,
    ])
}

fn print_profiles(
    link: &Link<LinkStream>,
    running: &AtomicBool,
    count: Option<usize>,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut printed = 0usize;
    let mut dropped = 0u64;
    let mut last_profile = Instant::now();

    while running.load(Ordering::SeqCst) {
        if count.is_some_and(|count| printed >= count) {
            break;
        }

        if let Some(report) = link.take_profile() {
            print_profile(&report, format);
            printed = printed.saturating_add(1);
            last_profile = Instant::now();
            continue;
        }

        if !link.is_running() {
            return Err(CliError::new(FAILURE, "device closed the link"));
        }
        if last_profile.elapsed() >= timeout {
            return Err(CliError::new(
                TIMEOUT,
                format!("no profile received for {timeout:?}"),
            ));
        }
        if let Some(event) = link.next_event(POLL_INTERVAL) {
            if log_event(&event) {
                dropped += 1;
            }
        }
    }

    tracing::info!(profiles = printed, dropped_frames = dropped, "done");
    Ok(SUCCESS)
}

/// Log a link event. Returns true when it reports a dropped frame.
fn log_event(event: &LinkEvent) -> bool {
    match event {
        LinkEvent::Dropped {
            message_id: Some(id),
            reason,
        } => {
            tracing::debug!(message_id = id, message = ids::message_name(*id), %reason, "frame dropped");
            true
        }
        LinkEvent::Dropped {
            message_id: None,
            reason,
        } => {
            tracing::debug!(%reason, "frame dropped");
            true
        }
        LinkEvent::Dispatched { message_id } => {
            tracing::trace!(message = ids::message_name(*message_id), "frame dispatched");
            false
        }
        LinkEvent::Closed => {
            tracing::debug!("link worker closed");
            false
        }
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
