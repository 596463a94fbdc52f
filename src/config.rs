//! Command-line flags, turned into the `Config` the shell runs with.

use clap::{Parser, ValueEnum};

use crate::job;

pub const DEFAULT_PROMPT: &str = "$ ";
pub const DEFAULT_MAX_LINE_LENGTH: usize = 2048;

#[derive(Debug, Clone, Parser)]
#[command(name = "msh", version, about = "A small interactive Unix shell.", long_about = None)]
pub struct CliArgs {
	/// Logging level (error, warn, info, debug, trace).
	///
	/// If omitted, `MSH_LOG` or `warn` is used.
	#[arg(long, value_enum, value_name = "LEVEL")]
	pub log_level: Option<LogLevel>,

	/// Prompt shown before each read when stdin is a terminal.
	#[arg(long, default_value = DEFAULT_PROMPT)]
	pub prompt: String,

	/// Lines this long or longer are rejected as syntax errors.
	#[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_LINE_LENGTH)]
	pub max_line_length: usize,

	/// How many background processes may run at once.
	#[arg(long, value_name = "N", default_value_t = job::DEFAULT_CAPACITY)]
	pub max_background: usize,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub prompt: String,
	pub max_line_length: usize,
	pub max_background: usize,
}

impl From<&CliArgs> for Config {
	fn from(args: &CliArgs) -> Config {
		Config {
			prompt: args.prompt.clone(),
			max_line_length: args.max_line_length.max(2),
			max_background: args.max_background,
		}
	}
}

pub fn parse() -> CliArgs {
	CliArgs::parse()
}
