// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Console I/O host functions for WebAssembly guests.
//!
//! Guest modules import a fixed set of functions from the `env` module (`print`, `print_err`,
//! the numeric `print_*` variants and `input_i32`/`input_i64`). This crate provides them in two
//! shapes:
//!
//! - [`ffi`]: a C ABI symbol table exported through `get_native_lib`, loadable by hosts that
//!   register native libraries as `(name, function pointer, signature)` records.
//! - [`host`]: the same functions registered on a [`wasmtime::Linker`].
//!
//! Both shapes share the console semantics in [`console`] and the symbol descriptions in
//! [`symbols`].

pub mod console;
mod error;
pub mod ffi;
pub mod host;
pub mod input;
pub mod signature;
pub mod symbols;

pub use console::{Capture, Console, Prompt};
pub use error::Error;
pub use host::{EnvHost, EnvState, InvalidInputPolicy};
pub use input::InputError;
pub use signature::{Signature, SignatureError, ValType};
pub use symbols::{MODULE_NAME, NativeFunction, native_lib};

pub type Result<T> = core::result::Result<T, Error>;
