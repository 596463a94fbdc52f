use std::io;
use std::io::Write;
use std::os::fd::{IntoRawFd, OwnedFd};

use nix::fcntl::OFlag;
use nix::unistd::{self, ForkResult};
use tracing::debug;

use crate::builtin;
use crate::errors::{Result, ShellError};
use crate::global;
use crate::job;
use crate::launch;
use crate::types::{Command, Pipeline};

fn run_builtin(func: builtin::Builtin, command: &Command) {
	if let Err(e) = func(&command.args) {
		debug!(name = command.name(), error = %e, "builtin failed");
		let _ = writeln!(io::stderr(), "Builtin {} error.", command.name());
	}
}

fn enter_child(state: &global::State, command: &Command, input: Option<OwnedFd>,
               output: Option<(OwnedFd, OwnedFd)>, is_background: bool) -> ! {
	if let Err(e) = state.signals.unblock() {
		launch::die("msh", &e.to_string());
	}
	if let Some(read) = input {
		launch::install_fd(read.into_raw_fd(), libc::STDIN_FILENO);
	}
	if let Some((read, write)) = output {
		drop(read);
		launch::install_fd(write.into_raw_fd(), libc::STDOUT_FILENO);
	}
	if is_background {
		let _ = unistd::setsid();
	}
	launch::launch(command)
}

// SIGCHLD must be blocked: every pid is recorded before its exit can be
// classified.
fn spawn_stages(state: &mut global::State, pipeline: &Pipeline,
                foreground: &mut job::ForegroundGroup) -> Result<()> {
	let n = pipeline.commands.len();
	let mut prev_read: Option<OwnedFd> = None;
	for (i, command) in pipeline.commands.iter().enumerate() {
		let pipe = if i + 1 < n {
			Some(unistd::pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?)
		} else {
			None
		};
		let _ = io::stdout().flush();

		match unsafe { unistd::fork() }.map_err(ShellError::Fork)? {
			ForkResult::Child => enter_child(state, command, prev_read, pipe, pipeline.is_background),
			ForkResult::Parent { child } => {
				debug!(pid = %child, stage = i, command = command.name(),
				       background = pipeline.is_background, "spawned");
				if pipeline.is_background {
					// room for every stage was checked before the first fork
					let added = state.jobs.add(child);
					debug_assert!(added.is_ok(), "background registry full at {}", child);
				} else {
					foreground.push(child);
				}
				prev_read = pipe.map(|(read, write)| {
					drop(write);
					read
				});
			},
		}
	}
	Ok(())
}

fn wait_foreground(state: &mut global::State, foreground: &mut job::ForegroundGroup) {
	loop {
		let jobs = &mut state.jobs;
		state.signals.drain(|pid, status| job::record_exit(jobs, foreground, pid, status));
		if foreground.is_empty() {
			break;
		}
		state.signals.suspend();
	}
}

/// Runs one pipeline. Returns only fatal errors; anything a single command
/// does wrong has been reported on stderr by then.
pub fn execute(state: &mut global::State, pipeline: &Pipeline) -> Result<()> {
	let commands = &pipeline.commands;
	if commands.is_empty() {
		return Ok(());
	}

	if commands.len() == 1 {
		if let Some(func) = builtin::match_builtin(commands[0].name()) {
			run_builtin(func, &commands[0]);
			return Ok(());
		}
	}

	if pipeline.is_background && !state.jobs.has_room(commands.len()) {
		let _ = writeln!(io::stderr(), "{}", job::JobError::Full);
		return Ok(());
	}

	let mut foreground = job::ForegroundGroup::new();
	state.signals.block()?;
	spawn_stages(state, pipeline, &mut foreground)?;
	if !pipeline.is_background {
		wait_foreground(state, &mut foreground);
	}
	state.signals.unblock()
}
