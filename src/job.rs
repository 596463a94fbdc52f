use std::io;
use std::io::Write;

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JobError {
	#[error("Too many background processes.")]
	Full,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Termination {
	Exited(i32),
	Signaled(i32),
}

pub trait WaitStatusExt {
	fn termination(self) -> Option<Termination>;
}

impl WaitStatusExt for WaitStatus {
	fn termination(self) -> Option<Termination> {
		match self {
			WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
			WaitStatus::Signaled(_, sig, _) => Some(Termination::Signaled(sig as i32)),
			_ => None,
		}
	}
}

fn decode(pid: Pid, status: i32) -> Option<Termination> {
	WaitStatus::from_raw(pid, status).ok().and_then(|s| s.termination())
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Finished {
	pub pid: Pid,
	pub status: i32,
}

#[derive(Debug)]
pub struct JobRegistry {
	capacity: usize,
	active: Vec<Pid>,
	finished: Vec<Finished>,
}

impl JobRegistry {
	pub fn new(capacity: usize) -> JobRegistry {
		JobRegistry {
			capacity,
			active: Vec::with_capacity(capacity),
			finished: Vec::with_capacity(capacity),
		}
	}

	// Finished entries count too: every active pid must find a slot in
	// `finished` when it is reaped.
	pub fn has_room(&self, n: usize) -> bool {
		self.active.len() + self.finished.len() + n <= self.capacity
	}

	pub fn add(&mut self, pid: Pid) -> Result<(), JobError> {
		if !self.has_room(1) {
			return Err(JobError::Full);
		}
		self.active.push(pid);
		Ok(())
	}

	pub fn remove(&mut self, pid: Pid) -> bool {
		match self.active.iter().position(|&p| p == pid) {
			Some(i) => {
				self.active.swap_remove(i);
				true
			},
			None => false,
		}
	}

	pub fn mark_finished(&mut self, pid: Pid, status: i32) -> Result<(), JobError> {
		if self.finished.len() >= self.capacity {
			return Err(JobError::Full);
		}
		self.finished.push(Finished { pid, status });
		Ok(())
	}

	pub fn drain_and_report<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
		for f in self.finished.drain(..) {
			match decode(f.pid, f.status) {
				Some(Termination::Exited(code)) =>
					writeln!(out, "Background process {} terminated. (exited with status {})", f.pid, code)?,
				Some(Termination::Signaled(sig)) =>
					writeln!(out, "Background process {} terminated. (killed by signal {})", f.pid, sig)?,
				None => debug!(pid = %f.pid, status = f.status, "unreportable wait status"),
			}
		}
		out.flush()
	}

	pub fn discard_finished(&mut self) {
		for f in self.finished.drain(..) {
			debug!(pid = %f.pid, status = f.status, "background process finished");
		}
	}

	pub fn active_len(&self) -> usize {
		self.active.len()
	}

	pub fn finished_len(&self) -> usize {
		self.finished.len()
	}
}

/// Children of the pipeline currently being waited on.
#[derive(Debug, Default)]
pub struct ForegroundGroup {
	pids: Vec<Pid>,
}

impl ForegroundGroup {
	pub fn new() -> ForegroundGroup {
		ForegroundGroup::default()
	}

	pub fn push(&mut self, pid: Pid) {
		self.pids.push(pid);
	}

	pub fn remove(&mut self, pid: Pid) -> bool {
		match self.pids.iter().position(|&p| p == pid) {
			Some(i) => {
				self.pids.swap_remove(i);
				true
			},
			None => false,
		}
	}

	pub fn remaining(&self) -> usize {
		self.pids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pids.is_empty()
	}
}

/// Routes one reaped child either to the background registry or to the
/// foreground group.
pub fn record_exit(jobs: &mut JobRegistry, foreground: &mut ForegroundGroup, pid: Pid, status: i32) {
	if jobs.remove(pid) {
		debug!(%pid, status, "background child reaped");
		let recorded = jobs.mark_finished(pid, status);
		debug_assert!(recorded.is_ok(), "no finished slot for {}", pid);
	} else if foreground.remove(pid) {
		debug!(%pid, status, remaining = foreground.remaining(), "foreground child reaped");
	} else {
		debug!(%pid, status, "reaped untracked child");
	}
}
