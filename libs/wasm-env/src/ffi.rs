// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! C ABI native library.
//!
//! Hosts that load native libraries look up [`get_native_lib`], which hands out the module name
//! and a table of [`NativeSymbol`] records. Every wrapper receives the host's execution
//! environment handle as its first argument, followed by the arguments described by its
//! signature string. `*~` pairs arrive already translated into native addresses and bounds
//! checked by the host.
//!
//! There is no way to report failure back through this ABI, so a failed `input_i32`/`input_i64`
//! writes `Invalid input` to stderr and aborts the process.

use crate::console;
use crate::symbols::NativeFunction;
use core::cell::UnsafeCell;
use core::ffi::{CStr, c_char, c_void};
use core::num::ParseIntError;
use core::str::FromStr;
use core::{ptr, slice};
use std::io::{self, IsTerminal};

/// Opaque execution environment of the calling guest.
#[repr(C)]
pub struct WasmExecEnv {
    _private: [u8; 0],
}

/// Handle passed as the first argument of every wrapper. The wrappers never dereference it.
pub type ExecEnv = *mut WasmExecEnv;

/// One entry of the native symbol table, laid out like the host's record.
#[repr(C)]
#[derive(Debug)]
pub struct NativeSymbol {
    /// NUL-terminated import name.
    pub symbol: *const c_char,
    /// The wrapper function.
    pub func_ptr: *mut c_void,
    /// NUL-terminated signature string.
    pub signature: *const c_char,
    /// Per-symbol context handed back to the wrapper, always null here.
    pub attachment: *mut c_void,
}

const MODULE_NAME: &CStr = c"env";

const SYMBOL_COUNT: usize = NativeFunction::ALL.len();

struct SymbolTable(UnsafeCell<[NativeSymbol; SYMBOL_COUNT]>);

// SAFETY: Rust code never writes to the table. The host receives a mutable pointer because it
// sorts the records in place while registering them, which happens once before any wrapper runs.
unsafe impl Sync for SymbolTable {}

macro_rules! native_symbol {
    ($name:literal, $signature:literal, $wrapper:ident) => {
        NativeSymbol {
            symbol: concat!($name, "\0").as_ptr().cast::<c_char>(),
            func_ptr: $wrapper as *mut c_void,
            signature: concat!($signature, "\0").as_ptr().cast::<c_char>(),
            attachment: ptr::null_mut(),
        }
    };
}

static NATIVE_SYMBOLS: SymbolTable = SymbolTable(UnsafeCell::new([
    native_symbol!("print", "(*~)", print_wrapper),
    native_symbol!("print_err", "(*~)", print_err_wrapper),
    native_symbol!("print_i32", "(i)", print_i32_wrapper),
    native_symbol!("print_bool", "(i)", print_bool_wrapper),
    native_symbol!("print_i64", "(I)", print_i64_wrapper),
    native_symbol!("print_f32", "(f)", print_f32_wrapper),
    native_symbol!("print_f64", "(F)", print_f64_wrapper),
    native_symbol!("input_i32", "()i", input_i32_wrapper),
    native_symbol!("input_i64", "()I", input_i64_wrapper),
]));

/// Hand the module name and the symbol table to the host.
///
/// Returns the number of records in the table. Null out-pointers are skipped.
///
/// # Safety
///
/// Non-null pointers must be valid for writes. The table stays valid for the lifetime of the
/// process and must only be mutated by reordering its records.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_native_lib(
    p_module_name: *mut *const c_char,
    p_native_symbols: *mut *mut NativeSymbol,
) -> u32 {
    if !p_module_name.is_null() {
        // SAFETY: checked for null above, validity is the caller's obligation
        unsafe { p_module_name.write(MODULE_NAME.as_ptr()) };
    }
    if !p_native_symbols.is_null() {
        // SAFETY: checked for null above, validity is the caller's obligation
        unsafe { p_native_symbols.write(NATIVE_SYMBOLS.0.get().cast::<NativeSymbol>()) };
    }

    tracing::debug!(count = SYMBOL_COUNT, "handing out native symbols for `env`");
    u32::try_from(SYMBOL_COUNT).unwrap_or(u32::MAX)
}

/// # Safety
///
/// `buf` must be null or point to `len` readable bytes.
unsafe fn guest_bytes<'a>(buf: *const c_char, len: i32) -> &'a [u8] {
    match usize::try_from(len) {
        Ok(len) if !buf.is_null() && len > 0 => {
            // SAFETY: ensured by the caller
            unsafe { slice::from_raw_parts(buf.cast::<u8>(), len) }
        }
        _ => &[],
    }
}

unsafe extern "C" fn print_wrapper(_exec_env: ExecEnv, buf: *const c_char, buf_len: i32) {
    // SAFETY: the host bounds checked the `*~` pair before translating it
    let bytes = unsafe { guest_bytes(buf, buf_len) };
    let _ = console::write_text(&mut io::stdout().lock(), bytes);
}

unsafe extern "C" fn print_err_wrapper(_exec_env: ExecEnv, buf: *const c_char, buf_len: i32) {
    // SAFETY: the host bounds checked the `*~` pair before translating it
    let bytes = unsafe { guest_bytes(buf, buf_len) };
    let _ = console::write_error(&mut io::stderr().lock(), bytes);
}

extern "C" fn print_bool_wrapper(_exec_env: ExecEnv, x: i32) {
    let _ = console::write_bool(&mut io::stdout().lock(), x);
}

extern "C" fn print_i32_wrapper(_exec_env: ExecEnv, x: i32) {
    let _ = console::write_int(&mut io::stdout().lock(), x);
}

extern "C" fn print_i64_wrapper(_exec_env: ExecEnv, x: i64) {
    let _ = console::write_int(&mut io::stdout().lock(), x);
}

extern "C" fn print_f32_wrapper(_exec_env: ExecEnv, x: f32) {
    let _ = console::write_float(&mut io::stdout().lock(), f64::from(x));
}

extern "C" fn print_f64_wrapper(_exec_env: ExecEnv, x: f64) {
    let _ = console::write_float(&mut io::stdout().lock(), x);
}

extern "C" fn input_i32_wrapper(_exec_env: ExecEnv) -> i32 {
    read_or_abort()
}

extern "C" fn input_i64_wrapper(_exec_env: ExecEnv) -> i64 {
    read_or_abort()
}

fn read_or_abort<T: FromStr<Err = ParseIntError>>() -> T {
    let prompt = io::stdout().is_terminal();
    match console::prompt_and_read(&mut io::stdout(), &mut io::stdin().lock(), prompt) {
        Ok(x) => x,
        Err(err) => {
            tracing::debug!(%err, "failed to read an integer");
            console::abort_invalid_input(&mut io::stderr().lock())
        }
    }
}
