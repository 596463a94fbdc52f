//! SIGCHLD bookkeeping.
//!
//! The handler only reaps and appends `(pid, raw status)` pairs to a static
//! mailbox. The main loop reads the mailbox with SIGCHLD blocked, so the two
//! sides never touch it at the same time.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use libc::c_int;
use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::unistd::Pid;

use crate::errors::{Result, ShellError};

const MAILBOX_SLOTS: usize = 256;

struct Slot {
	pid: AtomicI32,
	status: AtomicI32,
}

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY_SLOT: Slot = Slot { pid: AtomicI32::new(0), status: AtomicI32::new(0) };

struct Mailbox {
	len: AtomicUsize,
	slots: [Slot; MAILBOX_SLOTS],
}

impl Mailbox {
	const fn new() -> Mailbox {
		Mailbox { len: AtomicUsize::new(0), slots: [EMPTY_SLOT; MAILBOX_SLOTS] }
	}

	fn is_full(&self) -> bool {
		self.len.load(Ordering::SeqCst) >= MAILBOX_SLOTS
	}

	fn push(&self, pid: i32, status: i32) -> bool {
		let n = self.len.load(Ordering::SeqCst);
		if n >= MAILBOX_SLOTS {
			return false;
		}
		self.slots[n].pid.store(pid, Ordering::SeqCst);
		self.slots[n].status.store(status, Ordering::SeqCst);
		self.len.store(n + 1, Ordering::SeqCst);
		true
	}

	fn take<F>(&self, f: &mut F) -> usize where F: FnMut(Pid, i32) {
		let n = self.len.load(Ordering::SeqCst);
		for slot in &self.slots[.. n] {
			f(Pid::from_raw(slot.pid.load(Ordering::SeqCst)), slot.status.load(Ordering::SeqCst));
		}
		self.len.store(0, Ordering::SeqCst);
		n
	}
}

static MAILBOX: Mailbox = Mailbox::new();

// Stops early when the mailbox is full; the leftover zombies stay in the
// kernel until the next drain.
fn reap_into_mailbox() {
	while !MAILBOX.is_full() {
		let mut status: c_int = 0;
		let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
		if pid <= 0 {
			break;
		}
		MAILBOX.push(pid, status);
	}
}

extern "C" fn on_child_exit(_: c_int) {
	let saved = Errno::last_raw();
	reap_into_mailbox();
	Errno::set_raw(saved);
}

#[derive(Debug)]
pub struct SignalController {
	child_mask: SigSet,
}

impl SignalController {
	pub fn install() -> Result<SignalController> {
		let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty());
		let reap = SigAction::new(
			SigHandler::Handler(on_child_exit),
			SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
			SigSet::empty(),
		);
		unsafe {
			signal::sigaction(Signal::SIGINT, &ignore).map_err(ShellError::SignalAction)?;
			signal::sigaction(Signal::SIGCHLD, &reap).map_err(ShellError::SignalAction)?;
		}

		let mut child_mask = SigSet::empty();
		child_mask.add(Signal::SIGCHLD);
		Ok(SignalController { child_mask })
	}

	pub fn block(&self) -> Result<()> {
		signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(&self.child_mask), None)
			.map_err(ShellError::SignalMask)
	}

	pub fn unblock(&self) -> Result<()> {
		signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&self.child_mask), None)
			.map_err(ShellError::SignalMask)
	}

	/// Sleeps until any signal is delivered. Call with SIGCHLD blocked: the
	/// mask is swapped for an empty one atomically, so an exit that happened
	/// before the call still wakes it.
	pub fn suspend(&self) {
		let empty = SigSet::empty();
		unsafe { libc::sigsuspend(empty.as_ref()) };
	}

	/// Hands every child reaped so far to `f`, in the order they were reaped.
	/// SIGCHLD must be blocked.
	pub fn drain<F>(&self, mut f: F) where F: FnMut(Pid, i32) {
		loop {
			reap_into_mailbox();
			if MAILBOX.take(&mut f) == 0 {
				break;
			}
		}
	}
}

/// Puts SIGINT and SIGCHLD back to their defaults in a freshly forked child.
pub fn reset_for_child() {
	let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
	unsafe {
		let _ = signal::sigaction(Signal::SIGINT, &default);
		let _ = signal::sigaction(Signal::SIGCHLD, &default);
	}
}
