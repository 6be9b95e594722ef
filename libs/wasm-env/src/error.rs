// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::input::InputError;
use core::fmt::{Display, Formatter};
use std::io;

/// Errors raised by the `env` host functions.
///
/// When returned from a function registered through [`crate::host::register`] the error becomes a
/// trap of the calling guest and can be recovered with `anyhow::Error::downcast_ref`.
#[derive(Debug)]
pub enum Error {
    /// `input_i32` or `input_i64` could not read an integer from the console.
    InvalidInput(InputError),
    /// The calling instance neither exports a `memory` nor was given one by the host.
    MissingMemory,
    /// A guest pointer/length pair does not lie within guest memory.
    OutOfBounds {
        /// Offset of the first byte.
        ptr: u32,
        /// Number of bytes requested.
        len: u32,
        /// Current size of the guest memory in bytes.
        memory_size: usize,
    },
    /// Writing to a console stream failed.
    Io(io::Error),
}

impl From<InputError> for Error {
    fn from(err: InputError) -> Self {
        Self::InvalidInput(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidInput(err) => write!(f, "Invalid input: {err}"),
            Error::MissingMemory => write!(f, "guest has no linear memory to read from"),
            Error::OutOfBounds {
                ptr,
                len,
                memory_size,
            } => write!(
                f,
                "guest range {ptr}..{ptr}+{len} is out of bounds of a {memory_size} byte memory"
            ),
            Error::Io(err) => write!(f, "console write failed: {err}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::InvalidInput(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::MissingMemory | Error::OutOfBounds { .. } => None,
        }
    }
}
