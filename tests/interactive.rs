//! Sessions on a pseudo-terminal, so the shell prompts and reports finished
//! background processes.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use nix::pty::openpty;

// Each step is a line to type and how long to wait afterwards (ms). Returns
// everything the terminal showed, with `\r\n` folded to `\n`.
fn run_interactive(dir: &Path, flags: &[&str], steps: &[(&str, u64)]) -> String {
	let pty = openpty(None, None).unwrap();
	let slave = pty.slave;
	let mut child = Command::new(env!("CARGO_BIN_EXE_msh"))
		.args(flags)
		.current_dir(dir)
		.env_remove("MSH_LOG")
		.stdin(Stdio::from(slave.try_clone().unwrap()))
		.stdout(Stdio::from(slave.try_clone().unwrap()))
		.stderr(Stdio::from(slave))
		.spawn()
		.expect("failed to start msh");

	let mut writer = File::from(pty.master.try_clone().unwrap());
	let mut reader = File::from(pty.master);
	let collector = thread::spawn(move || {
		let mut out = vec![];
		let mut buf = [0u8; 4096];
		loop {
			match reader.read(&mut buf) {
				Ok(0) | Err(_) => break,
				Ok(n) => out.extend_from_slice(&buf[.. n]),
			}
		}
		out
	});

	thread::sleep(Duration::from_millis(200));
	for &(line, pause) in steps {
		writer.write_all(line.as_bytes()).unwrap();
		thread::sleep(Duration::from_millis(pause));
	}
	assert!(child.wait().unwrap().success());
	drop(writer);

	let out = collector.join().unwrap();
	String::from_utf8_lossy(&out).replace("\r\n", "\n")
}

fn count(haystack: &str, needle: &str) -> usize {
	haystack.matches(needle).count()
}

#[test]
fn background_exit_is_reported_once_before_next_prompt() {
	let dir = tempfile::tempdir().unwrap();
	let out = run_interactive(dir.path(), &[], &[
		("sleep 0.1 &\n", 600),
		("lecho marker-42\n", 300),
		("exit\n", 0),
	]);

	assert_eq!(count(&out, "Background process "), 1, "{:?}", out);
	assert_eq!(count(&out, "terminated. (exited with status 0)\n"), 1, "{:?}", out);

	let marker = out.find("\nmarker-42\n").expect("builtin output missing");
	let report = out.find("Background process ").unwrap();
	assert!(marker < report, "report printed before the command finished: {:?}", out);
	let after = &out[report ..];
	let line_end = after.find('\n').unwrap();
	assert!(after[line_end + 1 ..].starts_with("$ "), "report not followed by prompt: {:?}", out);
}

#[test]
fn report_waits_for_running_foreground_command() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("late.sh"), "sleep 0.4\necho late-output\n").unwrap();
	let out = run_interactive(dir.path(), &[], &[
		("sleep 0.1 & sh late.sh\n", 800),
		("exit\n", 0),
	]);

	let late = out.find("\nlate-output\n").expect("foreground output missing");
	let report = out.find("Background process ").expect("report missing");
	assert!(late < report, "report printed mid-command: {:?}", out);
	assert_eq!(count(&out, "Background process "), 1, "{:?}", out);
}

#[test]
fn killed_background_process_reports_signal() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("die.sh"), "kill -9 $$\n").unwrap();
	let out = run_interactive(dir.path(), &[], &[
		("sh die.sh &\n", 500),
		("lecho next\n", 300),
		("exit\n", 0),
	]);

	assert_eq!(count(&out, "terminated. (killed by signal 9)\n"), 1, "{:?}", out);
}

#[test]
fn unreported_jobs_count_against_the_limit() {
	let dir = tempfile::tempdir().unwrap();
	let out = run_interactive(dir.path(), &["--max-background", "2"], &[
		("sleep 0 & sleep 0 & sleep 0.3 ; sleep 0 & sleep 0 &\n", 400),
		("lecho done\n", 300),
		("exit\n", 0),
	]);

	assert_eq!(count(&out, "Too many background processes.\n"), 1, "{:?}", out);
	assert_eq!(count(&out, "terminated. (exited with status 0)\n"), 2, "{:?}", out);
}
