// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! `env` host functions for wasmtime.
//!
//! Unlike the C ABI library these functions can fail without taking the host down: a guest
//! pointer outside of its memory or a failed console write traps the guest, and so does invalid
//! integer input unless [`InvalidInputPolicy::Abort`] is selected.

use crate::console::{Console, Prompt};
use crate::symbols::{MODULE_NAME, NativeFunction};
use crate::{Error, signature};
use wasmtime::{AsContext, Caller, Extern, Linker, Memory};

/// What `input_i32`/`input_i64` do when the console does not yield an integer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInputPolicy {
    /// Trap the calling guest with [`Error::InvalidInput`].
    #[default]
    Trap,
    /// Print `Invalid input` to stderr and abort the host process.
    Abort,
}

/// Store data the `env` functions operate on.
pub trait EnvHost {
    fn console(&mut self) -> &mut Console;

    /// Memory the host defined as `env.memory`, used when the caller does not export its own.
    fn memory(&self) -> Option<Memory>;

    fn invalid_input_policy(&self) -> InvalidInputPolicy;
}

/// Ready-made [`EnvHost`].
#[derive(Debug)]
pub struct EnvState {
    console: Console,
    memory: Option<Memory>,
    policy: InvalidInputPolicy,
}

impl EnvState {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            memory: None,
            policy: InvalidInputPolicy::default(),
        }
    }

    /// A state on the process' standard streams.
    pub fn stdio(prompt: Prompt) -> Self {
        Self::new(Console::stdio(prompt))
    }

    #[must_use]
    pub fn with_policy(mut self, policy: InvalidInputPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_memory(&mut self, memory: Memory) {
        self.memory = Some(memory);
    }
}

impl EnvHost for EnvState {
    fn console(&mut self) -> &mut Console {
        &mut self.console
    }

    fn memory(&self) -> Option<Memory> {
        self.memory
    }

    fn invalid_input_policy(&self) -> InvalidInputPolicy {
        self.policy
    }
}

/// The wasmtime value type a guest passes for a signature parameter.
pub fn wasm_type(ty: signature::ValType) -> wasmtime::ValType {
    match ty.core_type() {
        signature::ValType::I64 => wasmtime::ValType::I64,
        signature::ValType::F32 => wasmtime::ValType::F32,
        signature::ValType::F64 => wasmtime::ValType::F64,
        _ => wasmtime::ValType::I32,
    }
}

/// Register every [`NativeFunction`] under [`MODULE_NAME`].
///
/// # Errors
///
/// Returns an error if the linker already defines one of the names and shadowing is disabled.
pub fn register<T: EnvHost + 'static>(linker: &mut Linker<T>) -> anyhow::Result<()> {
    for func in NativeFunction::ALL {
        register_one(linker, func)?;
    }
    tracing::debug!(
        "registered {} host functions under `{MODULE_NAME}`",
        NativeFunction::ALL.len()
    );
    Ok(())
}

fn register_one<T: EnvHost + 'static>(
    linker: &mut Linker<T>,
    func: NativeFunction,
) -> anyhow::Result<()> {
    let name = func.name();
    match func {
        NativeFunction::Print => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>, ptr: i32, len: i32| -> anyhow::Result<()> {
                    tracing::trace!(ptr, len, "env.print");
                    let bytes = guest_bytes(&mut caller, ptr, len)?;
                    caller.data_mut().console().print(&bytes).map_err(Error::Io)?;
                    Ok(())
                },
            )?;
        }
        NativeFunction::PrintErr => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>, ptr: i32, len: i32| -> anyhow::Result<()> {
                    tracing::trace!(ptr, len, "env.print_err");
                    let bytes = guest_bytes(&mut caller, ptr, len)?;
                    caller.data_mut().console().print_err(&bytes).map_err(Error::Io)?;
                    Ok(())
                },
            )?;
        }
        NativeFunction::PrintI32 => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>, x: i32| -> anyhow::Result<()> {
                    tracing::trace!(x, "env.print_i32");
                    caller.data_mut().console().print_i32(x).map_err(Error::Io)?;
                    Ok(())
                },
            )?;
        }
        NativeFunction::PrintBool => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>, x: i32| -> anyhow::Result<()> {
                    tracing::trace!(x, "env.print_bool");
                    caller.data_mut().console().print_bool(x).map_err(Error::Io)?;
                    Ok(())
                },
            )?;
        }
        NativeFunction::PrintI64 => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>, x: i64| -> anyhow::Result<()> {
                    tracing::trace!(x, "env.print_i64");
                    caller.data_mut().console().print_i64(x).map_err(Error::Io)?;
                    Ok(())
                },
            )?;
        }
        NativeFunction::PrintF32 => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>, x: f32| -> anyhow::Result<()> {
                    tracing::trace!(x, "env.print_f32");
                    caller.data_mut().console().print_f32(x).map_err(Error::Io)?;
                    Ok(())
                },
            )?;
        }
        NativeFunction::PrintF64 => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>, x: f64| -> anyhow::Result<()> {
                    tracing::trace!(x, "env.print_f64");
                    caller.data_mut().console().print_f64(x).map_err(Error::Io)?;
                    Ok(())
                },
            )?;
        }
        NativeFunction::InputI32 => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>| -> anyhow::Result<i32> {
                    let host = caller.data_mut();
                    let res = host.console().input_i32();
                    tracing::trace!(?res, "env.input_i32");
                    Ok(res.or_else(|err| invalid_input(host, err))?)
                },
            )?;
        }
        NativeFunction::InputI64 => {
            linker.func_wrap(
                MODULE_NAME,
                name,
                |mut caller: Caller<'_, T>| -> anyhow::Result<i64> {
                    let host = caller.data_mut();
                    let res = host.console().input_i64();
                    tracing::trace!(?res, "env.input_i64");
                    Ok(res.or_else(|err| invalid_input(host, err))?)
                },
            )?;
        }
    }
    Ok(())
}

fn invalid_input<T: EnvHost, R>(host: &mut T, err: crate::InputError) -> Result<R, Error> {
    match host.invalid_input_policy() {
        InvalidInputPolicy::Trap => Err(Error::InvalidInput(err)),
        InvalidInputPolicy::Abort => {
            tracing::debug!(%err, "aborting on invalid input");
            host.console().abort_invalid_input()
        }
    }
}

/// Copy `len` bytes at `ptr` out of the calling guest's memory.
fn guest_bytes<T: EnvHost + 'static>(
    caller: &mut Caller<'_, T>,
    ptr: i32,
    len: i32,
) -> crate::Result<Vec<u8>> {
    let memory = match caller.get_export("memory").and_then(Extern::into_memory) {
        Some(memory) => memory,
        None => caller.data().memory().ok_or(Error::MissingMemory)?,
    };

    let (ptr, len) = (to_offset(ptr), to_offset(len));
    let data = memory.data(caller.as_context());
    let range = usize::try_from(ptr)
        .ok()
        .zip(usize::try_from(len).ok())
        .and_then(|(start, len)| Some(start..start.checked_add(len)?));

    range
        .and_then(|range| data.get(range))
        .map(<[u8]>::to_vec)
        .ok_or(Error::OutOfBounds {
            ptr,
            len,
            memory_size: data.len(),
        })
}

/// Guest pointers and lengths are unsigned, even though they travel as `i32`.
fn to_offset(x: i32) -> u32 {
    u32::from_ne_bytes(x.to_ne_bytes())
}
