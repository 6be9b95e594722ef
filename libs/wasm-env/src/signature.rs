// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Native signature strings.
//!
//! A signature lists the parameter types between parentheses followed by an optional result type,
//! one character per type:
//!
//! | char | type                                            |
//! |------|-------------------------------------------------|
//! | `i`  | 32-bit integer                                  |
//! | `I`  | 64-bit integer                                  |
//! | `f`  | 32-bit float                                    |
//! | `F`  | 64-bit float                                    |
//! | `*`  | pointer into guest memory                       |
//! | `~`  | byte length of the immediately preceding `*`    |
//!
//! `(*~)` takes a buffer and returns nothing, `()I` takes nothing and returns a 64-bit integer.
//! The host marshals arguments based on these strings alone, so [`Signature`] renders exactly
//! the text it was parsed from.

use core::fmt;
use core::str::FromStr;

/// A single type character of a signature string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    I32,
    I64,
    F32,
    F64,
    /// Guest memory offset, translated into a native address by the host.
    Pointer,
    /// Length of the buffer named by the preceding [`ValType::Pointer`].
    Length,
}

impl ValType {
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Self::I32),
            'I' => Some(Self::I64),
            'f' => Some(Self::F32),
            'F' => Some(Self::F64),
            '*' => Some(Self::Pointer),
            '~' => Some(Self::Length),
            _ => None,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::I32 => 'i',
            Self::I64 => 'I',
            Self::F32 => 'f',
            Self::F64 => 'F',
            Self::Pointer => '*',
            Self::Length => '~',
        }
    }

    /// The core WebAssembly type a guest passes for this parameter.
    ///
    /// Pointers and lengths are both plain `i32`s on the guest side.
    pub const fn core_type(self) -> ValType {
        match self {
            Self::Pointer | Self::Length => Self::I32,
            other => other,
        }
    }
}

/// A parsed signature string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    params: Vec<ValType>,
    result: Option<ValType>,
}

impl Signature {
    /// Parse a signature string such as `(*~)` or `()i`.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] describing the first malformed position.
    pub fn parse(s: &str) -> Result<Self, SignatureError> {
        let mut chars = s.char_indices();

        match chars.next() {
            Some((_, '(')) => {}
            _ => return Err(SignatureError::MissingOpenParen),
        }

        let mut params = Vec::new();
        loop {
            let Some((offset, c)) = chars.next() else {
                return Err(SignatureError::MissingCloseParen);
            };
            if c == ')' {
                break;
            }

            let ty = ValType::from_char(c).ok_or(SignatureError::UnknownType { offset, c })?;
            if ty == ValType::Length && params.last() != Some(&ValType::Pointer) {
                return Err(SignatureError::DanglingLength { offset });
            }
            params.push(ty);
        }

        let result = match chars.next() {
            None => None,
            Some((offset, c)) => {
                let ty = ValType::from_char(c).ok_or(SignatureError::UnknownType { offset, c })?;
                if matches!(ty, ValType::Pointer | ValType::Length) {
                    return Err(SignatureError::InvalidResult { offset, c });
                }
                if let Some((offset, _)) = chars.next() {
                    return Err(SignatureError::TrailingCharacters { offset });
                }
                Some(ty)
            }
        };

        Ok(Self { params, result })
    }

    pub fn params(&self) -> &[ValType] {
        &self.params
    }

    pub fn result(&self) -> Option<ValType> {
        self.result
    }

    /// Parameter types as the guest sees them, with pointers and lengths lowered to `i32`.
    pub fn core_params(&self) -> impl ExactSizeIterator<Item = ValType> + '_ {
        self.params.iter().map(|ty| ty.core_type())
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for ty in &self.params {
            write!(f, "{}", ty.as_char())?;
        }
        f.write_str(")")?;
        if let Some(ty) = self.result {
            write!(f, "{}", ty.as_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature does not start with `(`.
    MissingOpenParen,
    /// The parameter list is never closed.
    MissingCloseParen,
    /// A character outside the type alphabet.
    UnknownType { offset: usize, c: char },
    /// A `~` that does not directly follow a `*`.
    DanglingLength { offset: usize },
    /// A pointer or length used as the result type.
    InvalidResult { offset: usize, c: char },
    /// More than one result type.
    TrailingCharacters { offset: usize },
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOpenParen => write!(f, "signature must start with `(`"),
            Self::MissingCloseParen => write!(f, "parameter list is missing a closing `)`"),
            Self::UnknownType { offset, c } => {
                write!(f, "unknown type `{c}` at offset {offset}")
            }
            Self::DanglingLength { offset } => {
                write!(f, "length `~` at offset {offset} does not follow a pointer `*`")
            }
            Self::InvalidResult { offset, c } => {
                write!(f, "`{c}` at offset {offset} cannot be used as a result type")
            }
            Self::TrailingCharacters { offset } => {
                write!(f, "unexpected characters after the result type at offset {offset}")
            }
        }
    }
}

impl core::error::Error for SignatureError {}
