//! Structured logging setup for stackcompose
//!
//! Diagnostics go to stderr so that the human summary on stdout stays clean.
//! `RUST_LOG` is honoured on top of the configured level.
//!
//! # Example
//!
//! ```no_run
//! use stackcompose::util::logging;
//! use tracing::{debug, info};
//!
//! logging::init_from_env();
//!
//! info!("Generation started");
//! debug!(root = "/srv/app", "Scanning project");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

pub const LOG_LEVEL_ENV: &str = "STACKCOMPOSE_LOG_LEVEL";
pub const LOG_JSON_ENV: &str = "STACKCOMPOSE_LOG_JSON";

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for the `stackcompose` target
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g. stackcompose::detection) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    /// WARN level, plain text, targets on.
    ///
    /// Warnings are the default so a normal run prints only the summary and
    /// absorbed failures worth surfacing.
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Debug level with source locations, used for `-vv` style tracing.
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_location: true,
            ..Default::default()
        }
    }

    fn directive(&self) -> String {
        format!("stackcompose={}", self.level)
    }
}

/// Parses a log level, case-insensitive. Unknown names fall back to WARN.
///
/// ```
/// use stackcompose::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("INFO"), Level::INFO);
/// assert_eq!(parse_level("invalid"), Level::WARN);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to WARN. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::WARN
        }
    }
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        match config.directive().parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Invalid log directive: {}", e),
        }

        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Reads `STACKCOMPOSE_LOG_LEVEL` and `STACKCOMPOSE_LOG_JSON`.
pub fn init_from_env() {
    init_logging(config_from_env());
}

fn config_from_env() -> LoggingConfig {
    let level = env::var(LOG_LEVEL_ENV)
        .map(|v| parse_level(&v))
        .unwrap_or(Level::WARN);

    let use_json = env::var(LOG_JSON_ENV)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level,
        use_json,
        ..Default::default()
    }
}

pub fn with_level(level_str: &str) {
    init_logging(LoggingConfig::with_level(parse_level(level_str)));
}
