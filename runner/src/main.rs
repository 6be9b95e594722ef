mod config;
mod exec;
mod logger;

use crate::config::{Config, OnInvalidInput, PromptMode};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process;

/// Helper for passing VERSION to opt.
/// If `CARGO_VERSION_INFO` is set, use it, otherwise use `CARGO_PKG_VERSION`.
fn version() -> &'static str {
    option_env!("CARGO_VERSION_INFO").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Runs a WebAssembly module against the `env` console functions
#[derive(Debug, Parser)]
#[clap(version = version())]
struct Args {
    /// Path to the module, in binary or text format
    module: PathBuf,
    /// Path to the runner configuration file, in TOML
    #[clap(short, long, env = "ENV_RUNNER_CONFIG")]
    config: Option<PathBuf>,
    /// The exported function to call, overrides the configuration
    #[clap(long)]
    entry: Option<String>,
    /// What to do when `input_i32`/`input_i64` read something that is not an integer
    #[clap(long, value_enum)]
    invalid_input: Option<OnInvalidInput>,
    /// When to print the `input int: ` prompt
    #[clap(long, value_enum)]
    prompt: Option<PromptMode>,
    /// Upper bound in pages for an imported memory without declared maximum [default: 100]
    #[clap(long)]
    max_pages: Option<u32>,
    /// Enables verbose logging
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    logger::init(args.verbose);

    match run(args) {
        Ok(code) => process::exit(code),
        Err(err) => {
            tracing::error!("{err:?}");
            process::exit(1);
        }
    }
}

fn run(args: Args) -> anyhow::Result<i32> {
    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(entry) = args.entry {
        cfg.entry = entry;
    }
    if let Some(policy) = args.invalid_input {
        cfg.input.on_invalid = policy;
    }
    if let Some(prompt) = args.prompt {
        cfg.input.prompt = prompt;
    }
    if let Some(max_pages) = args.max_pages {
        cfg.memory.max_pages = Some(max_pages);
    }

    tracing::debug!("{cfg:?}");

    exec::run(&args.module, &cfg)
}
