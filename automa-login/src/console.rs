//! Prompting over any reader/writer pair, stdin and stdout in the binary, buffers in tests.

use std::io::{BufRead, ErrorKind, Write};

use crate::error::LoginError;

/// A line based prompt.
pub struct Console<R, W> {
    input: R,
    output: W,
    hide_secrets: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Wraps a reader and a writer. Secrets are read like any other line until [`Console::hide_secrets`] says
    /// otherwise.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hide_secrets: false,
        }
    }

    /// With `hide` set, [`Console::prompt_secret`] reads from the terminal with echo off instead of from the
    /// wrapped reader. Only set it when both ends are a terminal.
    pub fn hide_secrets(mut self, hide: bool) -> Self {
        self.hide_secrets = hide;
        self
    }

    /// Writes `label`, reads one line and strips the line ending. Fails with [`LoginError::InputClosed`] on EOF.
    pub fn prompt(&mut self, label: &'static str) -> Result<String, LoginError> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(LoginError::InputClosed(label));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    /// Like [`Console::prompt`], but the answer is not echoed when secrets are hidden.
    pub fn prompt_secret(&mut self, label: &'static str) -> Result<String, LoginError> {
        if !self.hide_secrets {
            return self.prompt(label);
        }
        write!(self.output, "{label}: ")?;
        self.output.flush()?;
        match rpassword::read_password() {
            Ok(secret) => Ok(secret),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(LoginError::InputClosed(label)),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes one line of output.
    pub fn say(&mut self, message: &str) -> Result<(), LoginError> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    /// Gives the writer back, for inspecting what was printed.
    pub fn into_output(self) -> W {
        self.output
    }
}
