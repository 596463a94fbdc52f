use thiserror::Error;

use crate::types::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
	#[error("empty command")]
	EmptyCommand,
	#[error("empty redirect")]
	EmptyRedirect,
	#[error("unexpected character: '{0}'")]
	Unexpected(char),
}

type ParseResult<T> = Result<T, ParseError>;

struct Parser<'a> {
	line: &'a [u8],
	i: usize,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		matches!(c, b' ' | b'\t' | b'\n' | b'\r')
	}

	fn is_letter(c: u8) -> bool {
		match c {
			b'>' | b'<' | b'&' | b'|' | b';' => false,
			_ => !Parser::is_whitespace(c),
		}
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn peek(&self) -> Option<u8> {
		self.line.get(self.i).copied()
	}

	fn read_word(&mut self) -> Option<String> {
		let orig = self.i;
		self.proceed_while(Parser::is_letter);
		if orig == self.i {
			None
		} else {
			Some(String::from_utf8_lossy(&self.line[orig .. self.i]).into_owned())
		}
	}

	fn parse_redirect(&mut self) -> ParseResult<Option<Redirect>> {
		let typ = match self.peek() {
			Some(b'<') => {
				self.i += 1;
				RedirectType::Input
			},
			Some(b'>') => if self.line.get(self.i+1) == Some(&b'>') {
				self.i += 2;
				RedirectType::OutputAppend
			} else {
				self.i += 1;
				RedirectType::OutputTruncate
			},
			_ => { return Ok(None); },
		};

		self.skip_whitespaces();
		let target = self.read_word().ok_or(ParseError::EmptyRedirect)?;
		Ok(Some(Redirect { target, typ }))
	}

	fn parse_command(&mut self) -> ParseResult<Command> {
		let mut redirects: Vec<Redirect> = vec![];
		let mut args: Vec<String> = vec![];

		loop {
			self.skip_whitespaces();
			if let Some(redirect) = self.parse_redirect()? {
				redirects.push(redirect);
			} else if let Some(word) = self.read_word() {
				args.push(word);
			} else {
				break;
			}
		}

		if args.is_empty() {
			return Err(ParseError::EmptyCommand);
		}
		Ok(Command { args, redirects })
	}

	fn parse_pipeline(&mut self) -> ParseResult<Pipeline> {
		let mut commands: Vec<Command> = vec![];
		loop {
			commands.push(self.parse_command()?);
			if self.peek() == Some(b'|') {
				self.i += 1;
			} else {
				break;
			}
		}
		Ok(Pipeline { commands, is_background: false })
	}

	fn parse_line(&mut self) -> ParseResult<Vec<Pipeline>> {
		let mut pipelines: Vec<Pipeline> = vec![];
		self.skip_whitespaces();
		while self.peek().is_some() {
			let mut pipeline = self.parse_pipeline()?;
			match self.peek() {
				Some(b'&') => {
					self.i += 1;
					pipeline.is_background = true;
				},
				Some(b';') => { self.i += 1; },
				Some(c) => { return Err(ParseError::Unexpected(c as char)); },
				None => {},
			}
			pipelines.push(pipeline);
			self.skip_whitespaces();
		}
		Ok(pipelines)
	}
}

pub fn parse(line: &[u8]) -> ParseResult<Vec<Pipeline>> {
	let mut parser = Parser { line, i: 0 };
	parser.parse_line()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(args: &[&str]) -> Vec<String> {
		args.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn empty_line_has_no_pipelines() {
		assert_eq!(parse(b"").unwrap(), vec![]);
		assert_eq!(parse(b"   \t ").unwrap(), vec![]);
	}

	#[test]
	fn simple_command() {
		let p = parse(b"ls -l /tmp").unwrap();
		assert_eq!(p.len(), 1);
		assert!(!p[0].is_background);
		assert_eq!(p[0].commands[0].args, words(&["ls", "-l", "/tmp"]));
		assert!(p[0].commands[0].redirects.is_empty());
	}

	#[test]
	fn pipeline_keeps_stage_order() {
		let p = parse(b"seq 1 5 | sort -r|head -n 2").unwrap();
		let names: Vec<&str> = p[0].commands.iter().map(|c| c.name()).collect();
		assert_eq!(names, vec!["seq", "sort", "head"]);
	}

	#[test]
	fn redirections_interleave_with_words() {
		let p = parse(b"< in.txt cat -n >out.txt >> log.txt").unwrap();
		let cmd = &p[0].commands[0];
		assert_eq!(cmd.args, words(&["cat", "-n"]));
		assert_eq!(cmd.redirects, vec![
			Redirect { target: "in.txt".to_string(), typ: RedirectType::Input },
			Redirect { target: "out.txt".to_string(), typ: RedirectType::OutputTruncate },
			Redirect { target: "log.txt".to_string(), typ: RedirectType::OutputAppend },
		]);
	}

	#[test]
	fn background_and_sequence() {
		let p = parse(b"sleep 5 & lecho a ; lecho b;").unwrap();
		assert_eq!(p.len(), 3);
		assert!(p[0].is_background);
		assert!(!p[1].is_background);
		assert!(!p[2].is_background);
		assert_eq!(p[2].commands[0].args, words(&["lecho", "b"]));
	}

	#[test]
	fn syntax_errors() {
		assert_eq!(parse(b"ls | | wc"), Err(ParseError::EmptyCommand));
		assert_eq!(parse(b"ls |"), Err(ParseError::EmptyCommand));
		assert_eq!(parse(b"; ls"), Err(ParseError::EmptyCommand));
		assert_eq!(parse(b"cat <"), Err(ParseError::EmptyRedirect));
		assert_eq!(parse(b"cat > | wc"), Err(ParseError::EmptyRedirect));
		assert_eq!(parse(b"> out.txt"), Err(ParseError::EmptyCommand));
	}
}
