//! Errors that end the shell itself.
//!
//! Anything a single command can get wrong is reported where it happens and
//! never reaches this type.

use nix::errno::Errno;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
	#[error("pipe: {0}")]
	Pipe(#[source] Errno),

	#[error("fork: {0}")]
	Fork(#[source] Errno),

	#[error("sigprocmask: {0}")]
	SignalMask(#[source] Errno),

	#[error("sigaction: {0}")]
	SignalAction(#[source] Errno),

	#[error("read: {0}")]
	Read(#[source] Errno),

	#[error("logging: {0}")]
	Logging(String),
}

pub type Result<T> = std::result::Result<T, ShellError>;

/// Exit status used for every failure that terminates a process, whether the
/// shell itself or a child that could not start.
pub const EXEC_FAILURE: i32 = 127;
