mod builtin;
mod config;
mod errors;
mod eval;
mod global;
mod input;
mod job;
mod launch;
mod logging;
mod parser;
mod signal;
mod types;

use std::io;
use std::io::{IsTerminal, Write};
use std::process;

use tracing::debug;

use errors::EXEC_FAILURE;
use input::Line;

const SYNTAX_ERROR: &str = "Syntax error.";

fn main() {
	if let Err(e) = run_main() {
		let _ = writeln!(io::stderr(), "msh: {}", e);
		process::exit(EXEC_FAILURE);
	}
}

fn run_main() -> errors::Result<()> {
	let args = config::parse();
	logging::init_logging(args.log_level)?;
	let signals = signal::SignalController::install()?;
	let mut state = global::State::new(config::Config::from(&args), signals);
	run(&mut state)
}

fn syntax_error() {
	let _ = writeln!(io::stderr(), "{}", SYNTAX_ERROR);
}

fn run_line(state: &mut global::State, line: Line) -> errors::Result<()> {
	let line = match line {
		Line::Complete(line) => line,
		Line::TooLong => {
			syntax_error();
			return Ok(());
		},
	};
	match parser::parse(&line) {
		Ok(pipelines) => {
			for pipeline in &pipelines {
				eval::execute(state, pipeline)?;
			}
		},
		Err(e) => {
			debug!(error = %e, "parse failed");
			syntax_error();
		},
	}
	Ok(())
}

fn prompt(state: &mut global::State) {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	let _ = state.jobs.drain_and_report(&mut out);
	let _ = out.write_all(state.config.prompt.as_bytes());
	let _ = out.flush();
}

fn run(state: &mut global::State) -> errors::Result<()> {
	let interactive = io::stdin().is_terminal();
	let mut lines = input::LineBuffer::new(state.config.max_line_length);
	let mut buf = vec![0u8; state.config.max_line_length];
	loop {
		state.settle_background()?;
		if interactive {
			prompt(state);
		} else {
			state.jobs.discard_finished();
		}

		let n = input::read_chunk(&mut buf)?;
		if n == 0 {
			if let Some(line) = lines.finish() {
				run_line(state, line)?;
			}
			return Ok(());
		}
		for line in lines.feed(&buf[.. n]) {
			run_line(state, line)?;
		}
	}
}
