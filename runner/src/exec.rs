use crate::config::Config;
use anyhow::{Context, bail, ensure};
use std::path::Path;
use wasm_env::{EnvHost, EnvState, MODULE_NAME, NativeFunction};
use wasmtime::{Engine, ExternType, Linker, Memory, MemoryType, Module, Store, ValType};

/// Load the module at `path`, link it against `env` and call its entry function.
///
/// Returns the process exit code: zero if the entry returns nothing, otherwise its `i32` result as
/// mapped by [`exit_code`].
pub fn run(path: &Path, config: &Config) -> anyhow::Result<i32> {
    let engine = Engine::default();
    let module = Module::from_file(&engine, path)
        .with_context(|| format!("failed to load module {}", path.display()))?;
    tracing::info!("loaded module {}", path.display());

    let state =
        EnvState::stdio(config.input.prompt.into()).with_policy(config.input.on_invalid.into());
    let mut store = Store::new(&engine, state);
    let mut linker = Linker::new(&engine);

    wasm_env::host::register(&mut linker)?;
    define_env_imports(&mut linker, &mut store, &module, config)?;
    if config.trap_unknown_imports {
        linker.define_unknown_imports_as_traps(&module)?;
    }

    let instance = linker
        .instantiate(&mut store, &module)
        .context("failed to instantiate module")?;

    let entry = instance
        .get_func(&mut store, &config.entry)
        .with_context(|| format!("module does not export a function `{}`", config.entry))?;
    let ty = entry.ty(&store);
    ensure!(
        ty.params().len() == 0,
        "entry function `{}` must not take parameters",
        config.entry
    );

    tracing::debug!("calling `{}`", config.entry);
    let results: Vec<ValType> = ty.results().collect();
    let code = match results.as_slice() {
        [] => {
            entry.typed::<(), ()>(&store)?.call(&mut store, ())?;
            0
        }
        [ValType::I32] => exit_code(entry.typed::<(), i32>(&store)?.call(&mut store, ())?),
        _ => bail!(
            "entry function `{}` must return nothing or an i32, found {ty:?}",
            config.entry
        ),
    };

    store.data_mut().console().flush()?;
    Ok(code)
}

/// Exit statuses are truncated to 8 bits on Unix, so results outside of `0..=255` become 1 instead
/// of wrapping around to a possibly successful status.
fn exit_code(result: i32) -> i32 {
    if (0..=255).contains(&result) {
        result
    } else {
        tracing::warn!("entry returned {result}, which is not a valid exit status");
        1
    }
}

/// Provide the non-function imports of `env`, currently only `env.memory`.
fn define_env_imports(
    linker: &mut Linker<EnvState>,
    store: &mut Store<EnvState>,
    module: &Module,
    config: &Config,
) -> anyhow::Result<()> {
    for import in module.imports() {
        if import.module() != MODULE_NAME || NativeFunction::from_name(import.name()).is_some() {
            continue;
        }

        match (import.name(), import.ty()) {
            ("memory", ExternType::Memory(ty)) => {
                let ty = cap_memory(ty, config.memory.max_pages)?;
                tracing::debug!(
                    min = ty.minimum(),
                    max = ty.maximum(),
                    "defining `{MODULE_NAME}.memory`"
                );
                let memory = Memory::new(&mut *store, ty)?;
                linker.define(&*store, MODULE_NAME, "memory", memory)?;
                store.data_mut().set_memory(memory);
            }
            (name, _) if !config.trap_unknown_imports => {
                tracing::warn!("module imports unknown `{MODULE_NAME}.{name}`");
            }
            _ => {}
        }
    }

    Ok(())
}

/// Apply the configured maximum to a 32-bit memory type that declares none.
fn cap_memory(ty: MemoryType, max_pages: Option<u32>) -> anyhow::Result<MemoryType> {
    let Some(max) = max_pages else {
        return Ok(ty);
    };
    if ty.maximum().is_some() || ty.is_64() || ty.is_shared() {
        return Ok(ty);
    }

    let min = u32::try_from(ty.minimum()).context("memory minimum is out of range")?;
    ensure!(
        min <= max,
        "module requires {min} pages of memory but at most {max} are allowed"
    );
    Ok(MemoryType::new(min, Some(max)))
}
