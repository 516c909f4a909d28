use clap::ValueEnum;
use tracing_subscriber::filter::EnvFilter;

/// Full filter directive that overrides `--log-level`, e.g. `pinglink_frame=trace`.
pub const LOG_FILTER_ENV: &str = "PINGLINK_LOG";

/// Targets that follow `--log-level`. Everything else stays at `warn` or quieter.
const PINGLINK_TARGETS: &[&str] = &[
    "pinglink",
    "pinglink_transport",
    "pinglink_frame",
    "pinglink_schema",
    "pinglink_device",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Directive used when `PINGLINK_LOG` is unset.
fn default_directive(level: LogLevel) -> String {
    let base = if level == LogLevel::Error {
        "error"
    } else {
        "warn"
    };
    let mut directive = base.to_string();
    for target in PINGLINK_TARGETS {
        directive.push_str(&format!(",{target}={}", level.as_str()));
    }
    directive
}

fn build_filter(override_directive: Option<&str>, level: LogLevel) -> EnvFilter {
    if let Some(directive) = override_directive {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return filter,
            Err(err) => {
                eprintln!("invalid {LOG_FILTER_ENV} directive ({err}); using --log-level");
            }
        }
    }
    EnvFilter::new(default_directive(level))
}

/// Install the stderr subscriber. Library crates only emit `tracing` events.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let override_directive = std::env::var(LOG_FILTER_ENV).ok();
    let filter = build_filter(override_directive.as_deref(), level);

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
