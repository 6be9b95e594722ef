// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The console the `env` functions print to and read from.
//!
//! The free functions in this module implement the exact output format of each function against
//! any [`Write`]/[`BufRead`] and are shared by the C ABI wrappers in [`crate::ffi`]. [`Console`]
//! bundles a set of streams for hosts that keep the console in their store data.

use crate::input::{self, InputError};
use core::fmt::Display;
use core::num::ParseIntError;
use core::str::FromStr;
use std::io::{self, BufRead, Cursor, IsTerminal, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Prompt printed before reading an integer.
pub const INPUT_PROMPT: &str = "input int: ";

/// Prefix of every `print_err` line.
pub const ERROR_PREFIX: &str = "ERROR: ";

/// Diagnostic written to stderr when reading an integer failed fatally.
pub const INVALID_INPUT: &str = "Invalid input";

/// When `input_i32`/`input_i64` print [`INPUT_PROMPT`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Only if stdout is connected to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl Prompt {
    fn resolve(self) -> bool {
        match self {
            Prompt::Auto => io::stdout().is_terminal(),
            Prompt::Always => true,
            Prompt::Never => false,
        }
    }
}

/// Write `bytes` followed by a newline, without interpreting them as text.
pub fn write_text<W: Write + ?Sized>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    out.write_all(bytes)?;
    out.write_all(b"\n")
}

/// Write `bytes` as an error line: [`ERROR_PREFIX`], the bytes, and a newline.
pub fn write_error<W: Write + ?Sized>(err: &mut W, bytes: &[u8]) -> io::Result<()> {
    err.write_all(ERROR_PREFIX.as_bytes())?;
    write_text(err, bytes)
}

/// `True` for any non-zero value, `False` for zero.
pub fn write_bool<W: Write + ?Sized>(out: &mut W, x: i32) -> io::Result<()> {
    writeln!(out, "{}", if x != 0 { "True" } else { "False" })
}

pub fn write_int<W: Write + ?Sized>(out: &mut W, x: impl Display) -> io::Result<()> {
    writeln!(out, "{x}")
}

pub fn write_float<W: Write + ?Sized>(out: &mut W, x: f64) -> io::Result<()> {
    writeln!(out, "{}", format_fixed(x))
}

/// Format `x` the way C's `%f` does: fixed notation with six fractional digits, `inf`/`-inf`
/// for infinities and `nan`/`-nan` for NaNs.
pub fn format_fixed(x: f64) -> String {
    let sign = if x.is_sign_negative() { "-" } else { "" };
    if x.is_nan() {
        format!("{sign}nan")
    } else if x.is_infinite() {
        format!("{sign}inf")
    } else {
        format!("{x:.6}")
    }
}

/// Print the prompt if requested, then read one integer token.
///
/// # Errors
///
/// Returns [`InputError::Io`] if the prompt could not be written, and any error of
/// [`input::read_int`].
pub fn prompt_and_read<T, W, R>(out: &mut W, input: &mut R, prompt: bool) -> Result<T, InputError>
where
    T: FromStr<Err = ParseIntError>,
    W: Write + ?Sized,
    R: BufRead + ?Sized,
{
    if prompt {
        out.write_all(INPUT_PROMPT.as_bytes())
            .and_then(|()| out.flush())
            .map_err(InputError::Io)?;
    }
    input::read_int(input)
}

/// Write the fatal [`INVALID_INPUT`] diagnostic and abort the process.
pub fn abort_invalid_input<W: Write + ?Sized>(err: &mut W) -> ! {
    // the process is going down, a failed write changes nothing
    let _ = err.write_all(INVALID_INPUT.as_bytes());
    let _ = err.flush();
    std::process::abort()
}

/// A set of console streams.
///
/// The `print*` methods only fail if the underlying stream does.
pub struct Console {
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
    stdin: Box<dyn BufRead>,
    prompt: bool,
}

impl core::fmt::Debug for Console {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Console")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(
        stdout: impl Write + 'static,
        stderr: impl Write + 'static,
        stdin: impl BufRead + 'static,
    ) -> Self {
        Self {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            stdin: Box::new(stdin),
            prompt: false,
        }
    }

    /// The process' standard streams.
    ///
    /// Stdin stays locked for as long as the console lives.
    pub fn stdio(prompt: Prompt) -> Self {
        Self::new(io::stdout(), io::stderr(), io::stdin().lock()).with_prompt(prompt)
    }

    /// An in-memory console reading from `stdin`. Everything written to it can be inspected
    /// through the returned [`Capture`].
    pub fn captured(stdin: impl Into<Vec<u8>>) -> (Self, Capture) {
        let capture = Capture::default();
        let console = Self::new(
            SharedBuffer(Arc::clone(&capture.stdout)),
            SharedBuffer(Arc::clone(&capture.stderr)),
            Cursor::new(stdin.into()),
        );
        (console, capture)
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompt = prompt.resolve();
        self
    }

    pub fn prompts(&self) -> bool {
        self.prompt
    }

    pub fn print(&mut self, bytes: &[u8]) -> io::Result<()> {
        write_text(&mut self.stdout, bytes)
    }

    pub fn print_err(&mut self, bytes: &[u8]) -> io::Result<()> {
        write_error(&mut self.stderr, bytes)
    }

    pub fn print_bool(&mut self, x: i32) -> io::Result<()> {
        write_bool(&mut self.stdout, x)
    }

    pub fn print_i32(&mut self, x: i32) -> io::Result<()> {
        write_int(&mut self.stdout, x)
    }

    pub fn print_i64(&mut self, x: i64) -> io::Result<()> {
        write_int(&mut self.stdout, x)
    }

    pub fn print_f32(&mut self, x: f32) -> io::Result<()> {
        write_float(&mut self.stdout, f64::from(x))
    }

    pub fn print_f64(&mut self, x: f64) -> io::Result<()> {
        write_float(&mut self.stdout, x)
    }

    /// See [`prompt_and_read`].
    pub fn input_i32(&mut self) -> Result<i32, InputError> {
        prompt_and_read(&mut self.stdout, &mut self.stdin, self.prompt)
    }

    pub fn input_i64(&mut self) -> Result<i64, InputError> {
        prompt_and_read(&mut self.stdout, &mut self.stdin, self.prompt)
    }

    /// Write [`INVALID_INPUT`] to this console's stderr and abort the process.
    pub fn abort_invalid_input(&mut self) -> ! {
        let _ = self.stdout.flush();
        abort_invalid_input(&mut self.stderr)
    }

    /// # Errors
    ///
    /// Returns an error if flushing either output stream failed.
    pub fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()?;
        self.stderr.flush()
    }
}

/// Output captured by a [`Console::captured`] console.
#[derive(Debug, Default, Clone)]
pub struct Capture {
    stdout: Arc<Mutex<Vec<u8>>>,
    stderr: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    pub fn stdout(&self) -> Vec<u8> {
        lock(&self.stdout).clone()
    }

    pub fn stderr(&self) -> Vec<u8> {
        lock(&self.stderr).clone()
    }

    /// Captured stdout, lossily decoded.
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&lock(&self.stdout)).into_owned()
    }

    /// Captured stderr, lossily decoded.
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&lock(&self.stderr)).into_owned()
    }
}

fn lock(buf: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(PoisonError::into_inner)
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn captured(stdin: &str) -> (Console, Capture) {
        Console::captured(stdin)
    }

    #[test]
    fn print_appends_newline() {
        let (mut console, capture) = captured("");
        console.print(b"hello").unwrap();
        console.print(b"").unwrap();
        assert_eq!(capture.stdout(), b"hello\n\n");
        assert!(capture.stderr().is_empty());
    }

    #[test]
    fn print_err_goes_to_stderr() {
        let (mut console, capture) = captured("");
        console.print_err(b"index out of bounds").unwrap();
        assert_eq!(capture.stderr_string(), "ERROR: index out of bounds\n");
        assert!(capture.stdout().is_empty());
    }

    #[test]
    fn print_bool() {
        let (mut console, capture) = captured("");
        for x in [0, 1, -1, 2, i32::MIN] {
            console.print_bool(x).unwrap();
        }
        assert_eq!(capture.stdout_string(), "False\nTrue\nTrue\nTrue\nTrue\n");
    }

    #[test]
    fn print_integers() {
        let (mut console, capture) = captured("");
        for x in [0, -1, i32::MIN, i32::MAX] {
            console.print_i32(x).unwrap();
        }
        console.print_i64(i64::MIN).unwrap();
        console.print_i64(i64::MAX).unwrap();
        assert_eq!(
            capture.stdout_string(),
            "0\n-1\n-2147483648\n2147483647\n-9223372036854775808\n9223372036854775807\n"
        );
    }

    #[test]
    fn print_floats() {
        let (mut console, capture) = captured("");
        console.print_f32(1.5).unwrap();
        console.print_f32(0.1).unwrap();
        console.print_f64(-2.25).unwrap();
        console.print_f64(1e20).unwrap();
        console.print_f64(-0.0).unwrap();
        assert_eq!(
            capture.stdout_string(),
            "1.500000\n0.100000\n-2.250000\n100000000000000000000.000000\n-0.000000\n"
        );
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(format_fixed(f64::INFINITY), "inf");
        assert_eq!(format_fixed(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_fixed(f64::NAN), "nan");
        assert_eq!(format_fixed(-f64::NAN), "-nan");
    }

    #[test]
    fn input_without_prompt() {
        let (mut console, capture) = captured("42\n-7\n");
        assert_eq!(console.input_i32().unwrap(), 42);
        assert_eq!(console.input_i64().unwrap(), -7);
        assert!(capture.stdout().is_empty());
    }

    #[test]
    fn input_with_prompt() {
        let (console, capture) = captured("42\n");
        let mut console = console.with_prompt(Prompt::Always);
        assert_eq!(console.input_i32().unwrap(), 42);
        assert_eq!(capture.stdout_string(), "input int: ");
    }

    #[test]
    fn input_rejects_garbage() {
        let (mut console, _capture) = captured("abc\n");
        assert!(matches!(console.input_i32(), Err(InputError::Malformed(_))));

        let (mut console, _capture) = captured("");
        assert!(matches!(console.input_i64(), Err(InputError::Eof)));
    }

    proptest::proptest! {
        #[test]
        fn print_is_byte_exact(bytes: Vec<u8>) {
            let (mut console, capture) = Console::captured(Vec::new());
            console.print(&bytes).unwrap();

            let mut expected = bytes.clone();
            expected.push(b'\n');
            proptest::prop_assert_eq!(capture.stdout(), expected);
        }

        #[test]
        fn print_err_is_byte_exact(bytes: Vec<u8>) {
            let (mut console, capture) = Console::captured(Vec::new());
            console.print_err(&bytes).unwrap();

            let mut expected = b"ERROR: ".to_vec();
            expected.extend_from_slice(&bytes);
            expected.push(b'\n');
            proptest::prop_assert_eq!(capture.stderr(), expected);
        }

        #[test]
        fn non_zero_is_true(x in any::<i32>().prop_filter("non-zero", |x| *x != 0)) {
            let (mut console, capture) = Console::captured(Vec::new());
            console.print_bool(x).unwrap();
            proptest::prop_assert_eq!(capture.stdout_string(), "True\n");
        }
    }
}
