//! `tracing` setup.
//!
//! Level: `--log-level`, then `MSH_LOG`, then `warn`. Everything goes to
//! stderr so command output on stdout stays clean.

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::config::LogLevel;
use crate::errors::{Result, ShellError};

impl From<LogLevel> for Level {
	fn from(lvl: LogLevel) -> Level {
		match lvl {
			LogLevel::Error => Level::ERROR,
			LogLevel::Warn => Level::WARN,
			LogLevel::Info => Level::INFO,
			LogLevel::Debug => Level::DEBUG,
			LogLevel::Trace => Level::TRACE,
		}
	}
}

// Same names as `--log-level`, case-insensitive.
fn level_from_env(value: &str) -> Option<LogLevel> {
	LogLevel::from_str(value.trim(), true).ok()
}

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
	let level = cli_level
		.or_else(|| std::env::var("MSH_LOG").ok().and_then(|s| level_from_env(&s)))
		.map_or(Level::WARN, Level::from);

	fmt()
		.with_max_level(level)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|e| ShellError::Logging(e.to_string()))
}
