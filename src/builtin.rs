use std::{env, fs, io, process};
use io::Write;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::{self, Pid};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuiltinError {
	#[error("bad usage")]
	Usage,
	#[error("HOME is not set")]
	NoHome,
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error(transparent)]
	Sys(#[from] Errno),
}

pub type Builtin = fn(&[String]) -> Result<(), BuiltinError>;

pub fn builtin_exit(_: &[String]) -> Result<(), BuiltinError> {
	let _ = io::stdout().flush();
	process::exit(0)
}

pub fn builtin_echo(args: &[String]) -> Result<(), BuiltinError> {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	writeln!(out, "{}", args[1 ..].join(" "))?;
	out.flush()?;
	Ok(())
}

pub fn builtin_cd(args: &[String]) -> Result<(), BuiltinError> {
	let target = match args.len() {
		1 => env::var_os("HOME").ok_or(BuiltinError::NoHome)?,
		2 => args[1].clone().into(),
		_ => return Err(BuiltinError::Usage),
	};
	unistd::chdir(target.as_os_str())?;
	Ok(())
}

fn parse_kill_args(args: &[String]) -> Result<(Pid, Option<Signal>), BuiltinError> {
	let (sig, pid) = match args.len() {
		2 => (None, &args[1]),
		3 => (Some(&args[1]), &args[2]),
		_ => return Err(BuiltinError::Usage),
	};
	let pid: i32 = pid.parse().map_err(|_| BuiltinError::Usage)?;
	let sig = match sig {
		None => Some(Signal::SIGTERM),
		Some(s) => {
			let n: i32 = s.strip_prefix('-').ok_or(BuiltinError::Usage)?
				.parse().map_err(|_| BuiltinError::Usage)?;
			if n == 0 { None } else { Some(Signal::try_from(n)?) }
		},
	};
	Ok((Pid::from_raw(pid), sig))
}

pub fn builtin_kill(args: &[String]) -> Result<(), BuiltinError> {
	let (pid, sig) = parse_kill_args(args)?;
	signal::kill(pid, sig)?;
	Ok(())
}

pub fn builtin_ls(args: &[String]) -> Result<(), BuiltinError> {
	if args.len() != 1 {
		return Err(BuiltinError::Usage);
	}
	let stdout = io::stdout();
	let mut out = stdout.lock();
	for entry in fs::read_dir(".")? {
		let name = entry?.file_name();
		let name = name.to_string_lossy();
		if !name.starts_with('.') {
			writeln!(out, "{}", name)?;
		}
	}
	out.flush()?;
	Ok(())
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"exit" => Some(builtin_exit),
		"lecho" => Some(builtin_echo),
		"lcd" | "cd" => Some(builtin_cd),
		"lkill" => Some(builtin_kill),
		"lls" => Some(builtin_ls),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(a: &[&str]) -> Vec<String> {
		a.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn known_names() {
		for name in ["exit", "lecho", "lcd", "cd", "lkill", "lls"] {
			assert!(match_builtin(name).is_some(), "{}", name);
		}
		assert!(match_builtin("echo").is_none());
		assert!(match_builtin("ls").is_none());
	}

	#[test]
	fn cd_rejects_extra_arguments() {
		assert!(matches!(builtin_cd(&args(&["lcd", "a", "b"])), Err(BuiltinError::Usage)));
	}

	#[test]
	fn cd_to_missing_directory_fails() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("nope").to_string_lossy().into_owned();
		assert!(matches!(builtin_cd(&args(&["lcd", &missing])), Err(BuiltinError::Sys(Errno::ENOENT))));
	}

	#[test]
	fn kill_arguments() {
		let (pid, sig) = parse_kill_args(&args(&["lkill", "123"])).unwrap();
		assert_eq!((pid.as_raw(), sig), (123, Some(Signal::SIGTERM)));

		let (pid, sig) = parse_kill_args(&args(&["lkill", "-9", "55"])).unwrap();
		assert_eq!((pid.as_raw(), sig), (55, Some(Signal::SIGKILL)));

		let (_, sig) = parse_kill_args(&args(&["lkill", "-0", "55"])).unwrap();
		assert_eq!(sig, None);

		assert!(parse_kill_args(&args(&["lkill"])).is_err());
		assert!(parse_kill_args(&args(&["lkill", "9", "55"])).is_err());
		assert!(parse_kill_args(&args(&["lkill", "-x", "55"])).is_err());
		assert!(parse_kill_args(&args(&["lkill", "abc"])).is_err());
	}

	#[test]
	fn ls_takes_no_arguments() {
		assert!(matches!(builtin_ls(&args(&["lls", "/"])), Err(BuiltinError::Usage)));
	}
}
