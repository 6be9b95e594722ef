// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The functions exported to guests under [`MODULE_NAME`].

use crate::signature::Signature;

/// Module name guests import the functions from.
pub const MODULE_NAME: &str = "env";

/// One host function of the `env` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeFunction {
    Print,
    PrintErr,
    PrintI32,
    PrintBool,
    PrintI64,
    PrintF32,
    PrintF64,
    InputI32,
    InputI64,
}

impl NativeFunction {
    /// Every function, in symbol table order.
    pub const ALL: [NativeFunction; 9] = [
        Self::Print,
        Self::PrintErr,
        Self::PrintI32,
        Self::PrintBool,
        Self::PrintI64,
        Self::PrintF32,
        Self::PrintF64,
        Self::InputI32,
        Self::InputI64,
    ];

    /// The name guest modules import this function by.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::PrintErr => "print_err",
            Self::PrintI32 => "print_i32",
            Self::PrintBool => "print_bool",
            Self::PrintI64 => "print_i64",
            Self::PrintF32 => "print_f32",
            Self::PrintF64 => "print_f64",
            Self::InputI32 => "input_i32",
            Self::InputI64 => "input_i64",
        }
    }

    /// The native signature string of this function.
    pub const fn signature(self) -> &'static str {
        match self {
            Self::Print | Self::PrintErr => "(*~)",
            Self::PrintI32 | Self::PrintBool => "(i)",
            Self::PrintI64 => "(I)",
            Self::PrintF32 => "(f)",
            Self::PrintF64 => "(F)",
            Self::InputI32 => "()i",
            Self::InputI64 => "()I",
        }
    }

    /// [`Self::signature`], parsed.
    ///
    /// # Panics
    ///
    /// Only if a signature constant is malformed. The unit tests parse every one of them.
    pub fn parsed_signature(self) -> Signature {
        Signature::parse(self.signature())
            .unwrap_or_else(|err| panic!("invalid signature for `{}`: {err}", self.name()))
    }

    /// Look a function up by its import name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|func| func.name() == name)
    }
}

/// The module name and the functions registered under it.
pub fn native_lib() -> (&'static str, &'static [NativeFunction]) {
    (MODULE_NAME, &NativeFunction::ALL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = NativeFunction::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), NativeFunction::ALL.len());
    }

    #[test]
    fn signatures_parse() {
        for func in NativeFunction::ALL {
            let sig = func.parsed_signature();
            assert_eq!(sig.to_string(), func.signature());
        }
    }

    #[test]
    fn lookup_by_name() {
        for func in NativeFunction::ALL {
            assert_eq!(NativeFunction::from_name(func.name()), Some(func));
        }
        assert_eq!(NativeFunction::from_name("print_u8"), None);
    }

    #[test]
    fn native_lib_is_env() {
        let (module, funcs) = native_lib();
        assert_eq!(module, "env");
        assert_eq!(funcs.len(), 9);
    }
}
