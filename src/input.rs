use nix::errno::Errno;
use nix::unistd;

use crate::errors::{Result, ShellError};

#[derive(Debug, PartialEq, Eq)]
pub enum Line {
	Complete(Vec<u8>),
	TooLong,
}

/// Splits raw stdin chunks into lines no longer than `max_len - 1` bytes.
#[derive(Debug)]
pub struct LineBuffer {
	max_len: usize,
	pending: Vec<u8>,
	overflowed: bool,
}

impl LineBuffer {
	pub fn new(max_len: usize) -> LineBuffer {
		LineBuffer { max_len, pending: Vec::with_capacity(max_len), overflowed: false }
	}

	fn push(&mut self, bytes: &[u8]) {
		if self.overflowed || self.pending.len() + bytes.len() >= self.max_len {
			self.overflowed = true;
			self.pending.clear();
		} else {
			self.pending.extend_from_slice(bytes);
		}
	}

	fn take(&mut self) -> Line {
		let line = if self.overflowed {
			Line::TooLong
		} else {
			Line::Complete(std::mem::take(&mut self.pending))
		};
		self.pending.clear();
		self.overflowed = false;
		line
	}

	pub fn feed(&mut self, chunk: &[u8]) -> Vec<Line> {
		let mut lines = vec![];
		let mut rest = chunk;
		while let Some(nl) = rest.iter().position(|&c| c == b'\n') {
			self.push(&rest[.. nl]);
			lines.push(self.take());
			rest = &rest[nl + 1 ..];
		}
		if !rest.is_empty() {
			self.push(rest);
		}
		lines
	}

	/// What is left once input has ended.
	pub fn finish(&mut self) -> Option<Line> {
		if self.overflowed || !self.pending.is_empty() {
			Some(self.take())
		} else {
			None
		}
	}
}

/// Reads one chunk from stdin; `Ok(0)` means end of input.
pub fn read_chunk(buf: &mut [u8]) -> Result<usize> {
	loop {
		match unistd::read(libc::STDIN_FILENO, buf) {
			Err(Errno::EINTR) => continue,
			r => return r.map_err(ShellError::Read),
		}
	}
}
