use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use wasm_env::{InvalidInputPolicy, Prompt};

fn default_entry() -> String {
    "main".to_string()
}

fn default_max_pages() -> Option<u32> {
    Some(100)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// The exported function to call
    #[serde(default = "default_entry")]
    pub entry: String,
    /// Satisfy imports the runner does not provide with functions that trap when called
    #[serde(default)]
    pub trap_unknown_imports: bool,
    /// Configuration of an imported `env.memory`
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Configuration of `input_i32`/`input_i64`
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MemoryConfig {
    /// Upper bound in 64KiB pages for an imported memory that declares no maximum itself
    #[serde(default = "default_max_pages")]
    pub max_pages: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InputConfig {
    /// When to print the `input int: ` prompt
    #[serde(default)]
    pub prompt: PromptMode,
    /// What to do when the input is not an integer
    #[serde(default)]
    pub on_invalid: OnInvalidInput,
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PromptMode {
    /// Prompt only if stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OnInvalidInput {
    /// Trap the guest and exit with an error
    #[default]
    Trap,
    /// Print `Invalid input` and abort the process
    Abort,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            trap_unknown_imports: false,
            memory: MemoryConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl From<PromptMode> for Prompt {
    fn from(mode: PromptMode) -> Self {
        match mode {
            PromptMode::Auto => Prompt::Auto,
            PromptMode::Always => Prompt::Always,
            PromptMode::Never => Prompt::Never,
        }
    }
}

impl From<OnInvalidInput> for InvalidInputPolicy {
    fn from(value: OnInvalidInput) -> Self {
        match value {
            OnInvalidInput::Trap => InvalidInputPolicy::Trap,
            OnInvalidInput::Abort => InvalidInputPolicy::Abort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.entry, "main");
        assert!(!cfg.trap_unknown_imports);
        assert_eq!(cfg.memory.max_pages, Some(100));
        assert_eq!(cfg.input.prompt, PromptMode::Auto);
        assert_eq!(cfg.input.on_invalid, OnInvalidInput::Trap);
    }

    #[test]
    fn full_config() {
        let cfg = Config::parse(indoc! {r#"
            entry = "start"
            trap-unknown-imports = true

            [memory]
            max-pages = 100

            [input]
            prompt = "never"
            on-invalid = "abort"
        "#})
        .unwrap();

        assert_eq!(cfg.entry, "start");
        assert!(cfg.trap_unknown_imports);
        assert_eq!(cfg.memory.max_pages, Some(100));
        assert_eq!(cfg.input.prompt, PromptMode::Never);
        assert_eq!(cfg.input.on_invalid, OnInvalidInput::Abort);
    }

    #[test]
    fn empty_memory_section_keeps_page_cap() {
        let cfg = Config::parse("[memory]").unwrap();
        assert_eq!(cfg.memory.max_pages, Some(100));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("entrypoint = \"main\"").is_err());
        assert!(Config::parse("[input]\nretry = true").is_err());
    }
}
