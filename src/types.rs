#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, OutputTruncate, OutputAppend }

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub target: String,
	pub typ: RedirectType,
}

impl Redirect {
	pub fn target_fd(&self) -> i32 {
		match self.typ {
			RedirectType::Input => libc::STDIN_FILENO,
			RedirectType::OutputTruncate | RedirectType::OutputAppend => libc::STDOUT_FILENO,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command {
	pub args: Vec<String>,
	pub redirects: Vec<Redirect>,
}

impl Command {
	pub fn name(&self) -> &str {
		&self.args[0]
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub commands: Vec<Command>,
	pub is_background: bool,
}
