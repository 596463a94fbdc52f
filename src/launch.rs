//! Everything that runs in a forked child between `fork` and `execvp`.

use std::ffi::CString;
use std::fs;
use std::io::{self, Write};
use std::os::fd::IntoRawFd;
use std::os::unix::fs::OpenOptionsExt;

use nix::errno::Errno;
use nix::{fcntl, unistd};

use crate::errors::EXEC_FAILURE;
use crate::signal;
use crate::types::{Command, Redirect, RedirectType};

const FILE_MODE: u32 = 0o644;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LaunchFailure {
	NotFound,
	PermissionDenied,
	Other,
}

impl LaunchFailure {
	pub fn from_errno(errno: Errno) -> LaunchFailure {
		match errno {
			Errno::ENOENT => LaunchFailure::NotFound,
			Errno::EACCES => LaunchFailure::PermissionDenied,
			_ => LaunchFailure::Other,
		}
	}

	pub fn from_io(e: &io::Error) -> LaunchFailure {
		e.raw_os_error().map_or(LaunchFailure::Other, |n| LaunchFailure::from_errno(Errno::from_raw(n)))
	}

	pub fn describe(self) -> &'static str {
		match self {
			LaunchFailure::NotFound => "no such file or directory",
			LaunchFailure::PermissionDenied => "permission denied",
			LaunchFailure::Other => "exec error",
		}
	}
}

pub fn open_options(typ: RedirectType) -> fs::OpenOptions {
	let mut oopt = fs::OpenOptions::new();
	oopt.mode(FILE_MODE);
	let _ = match typ {
		RedirectType::Input => oopt.read(true),
		RedirectType::OutputTruncate => oopt.write(true).create(true).truncate(true),
		RedirectType::OutputAppend => oopt.append(true).create(true),
	};
	oopt
}

pub fn die(subject: &str, message: &str) -> ! {
	let _ = writeln!(io::stderr(), "{}: {}", subject, message);
	unsafe { libc::_exit(EXEC_FAILURE) }
}

pub fn install_fd(fd: i32, target: i32) {
	if fd == target {
		// already in place, but opened close-on-exec
		let _ = fcntl::fcntl(fd, fcntl::FcntlArg::F_SETFD(fcntl::FdFlag::empty()));
		return;
	}
	if let Err(e) = unistd::dup2(fd, target) {
		die("dup2", e.desc());
	}
	let _ = unistd::close(fd);
}

fn apply_redirect(redirect: &Redirect) -> Result<(), LaunchFailure> {
	let file = open_options(redirect.typ)
		.open(&redirect.target)
		.map_err(|e| LaunchFailure::from_io(&e))?;
	install_fd(file.into_raw_fd(), redirect.target_fd());
	Ok(())
}

/// Replaces the current (child) process with `command`. Never returns: a
/// failed redirection or exec ends the child with `EXEC_FAILURE`.
pub fn launch(command: &Command) -> ! {
	for redirect in &command.redirects {
		if let Err(failure) = apply_redirect(redirect) {
			die(&redirect.target, failure.describe());
		}
	}

	signal::reset_for_child();

	let argv: Result<Vec<CString>, _> = command.args.iter().map(|a| CString::new(a.as_bytes())).collect();
	let argv = match argv {
		Ok(argv) => argv,
		Err(_) => die(command.name(), LaunchFailure::Other.describe()),
	};
	let errno = match unistd::execvp(&argv[0], &argv) {
		Err(e) => e,
		Ok(never) => match never {},
	};
	die(command.name(), LaunchFailure::from_errno(errno).describe())
}
