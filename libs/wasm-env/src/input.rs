// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Reading integers from the console.
//!
//! Tokens follow C's `scanf("%d")`: leading whitespace is skipped, an optional sign is followed by
//! one or more decimal digits, and the first byte that is not a digit ends the token. That byte
//! and anything after it stay in the reader for the next call, so `"1 2\n"` satisfies two reads.

use core::fmt;
use core::num::{IntErrorKind, ParseIntError};
use core::str::FromStr;
use std::io::{self, BufRead};

#[derive(Debug)]
pub enum InputError {
    /// The input ended before a digit was read.
    Eof,
    /// The next token is not a decimal integer.
    Malformed(String),
    /// The integer does not fit the requested width.
    OutOfRange(String),
    /// Reading from the input stream failed.
    Io(io::Error),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => write!(f, "no more input"),
            Self::Malformed(token) if token.is_empty() => write!(f, "expected an integer"),
            Self::Malformed(token) => write!(f, "expected an integer, found `{token}`"),
            Self::OutOfRange(token) => write!(f, "integer `{token}` is out of range"),
            Self::Io(err) => write!(f, "failed to read input: {err}"),
        }
    }
}

impl core::error::Error for InputError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Read one signed decimal integer from `reader`.
///
/// # Errors
///
/// Returns [`InputError`] if the input is exhausted, the next token is not an integer, or the
/// value does not fit into `T`.
pub fn read_int<T, R>(reader: &mut R) -> Result<T, InputError>
where
    T: FromStr<Err = ParseIntError>,
    R: BufRead + ?Sized,
{
    skip_whitespace(reader)?;

    let mut token = String::new();
    if let Some(sign) = peek(reader)?.filter(|b| *b == b'-' || *b == b'+') {
        token.push(char::from(sign));
        reader.consume(1);
    }

    let mut digits = 0;
    while let Some(b) = peek(reader)?.filter(u8::is_ascii_digit) {
        token.push(char::from(b));
        reader.consume(1);
        digits += 1;
    }

    if digits == 0 {
        return Err(if token.is_empty() && peek(reader)?.is_none() {
            InputError::Eof
        } else {
            InputError::Malformed(token)
        });
    }

    token.parse().map_err(|err: ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => InputError::OutOfRange(token),
        _ => InputError::Malformed(token),
    })
}

fn skip_whitespace<R: BufRead + ?Sized>(reader: &mut R) -> Result<(), InputError> {
    while let Some(b) = peek(reader)? {
        // C `isspace` also accepts vertical tab, which `u8::is_ascii_whitespace` does not
        if b.is_ascii_whitespace() || b == 0x0b {
            reader.consume(1);
        } else {
            break;
        }
    }
    Ok(())
}

fn peek<R: BufRead + ?Sized>(reader: &mut R) -> Result<Option<u8>, InputError> {
    loop {
        match reader.fill_buf() {
            Ok(buf) => return Ok(buf.first().copied()),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(InputError::Io(err)),
        }
    }
}
