//! CLI command implementations.

pub(crate) mod eval;
pub(crate) mod process;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use wpi_config::{CliSettings, Config, DirectivesConfig, StateResolutionMode};
use wpi_directives::{ProcessorConfig, StateResolution};
use wpi_store::Store;

use crate::error::CliError;

pub(crate) use eval::EvalArgs;
pub(crate) use process::ProcessArgs;

/// `--state-resolution` values.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ResolutionArg {
    /// Walk the whole store from its top-level keys.
    Global,
    /// Walk the store entry of the active `interactive` namespace.
    Namespace,
}

impl From<ResolutionArg> for StateResolutionMode {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Global => Self::Global,
            ResolutionArg::Namespace => Self::Namespace,
        }
    }
}

/// Options shared by every command that reads the store.
#[derive(Args)]
pub(crate) struct StoreArgs {
    /// Path to configuration file (default: auto-discover wpi.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file merged into the store (repeatable, after configured seeds).
    #[arg(short, long = "store", value_name = "FILE")]
    stores: Vec<PathBuf>,

    /// How `state.*` references resolve (overrides config).
    #[arg(long, value_enum)]
    state_resolution: Option<ResolutionArg>,

    /// Namespace used outside any `interactive` scope (overrides config).
    #[arg(long)]
    default_namespace: Option<String>,
}

impl StoreArgs {
    /// Load configuration with these arguments applied on top.
    fn load_config(self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            state_resolution: self.state_resolution.map(Into::into),
            default_namespace: self.default_namespace,
            store_seeds: self.stores,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Build a store from every configured seed file, merged in order.
fn seed_store(seeds: &[PathBuf]) -> Result<Store, CliError> {
    let store = Store::new();
    for path in seeds {
        let json = read_file(path)?;
        store.merge_json(&json).map_err(|source| CliError::Seed {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Seeded store");
    }
    Ok(store)
}

fn state_resolution(config: &DirectivesConfig) -> StateResolution {
    match config.state_resolution {
        StateResolutionMode::Global => StateResolution::Global,
        StateResolutionMode::Namespace => StateResolution::Namespaced {
            default_namespace: config.default_namespace.clone(),
        },
    }
}

fn processor_config(config: &DirectivesConfig) -> ProcessorConfig {
    ProcessorConfig::new().with_state_resolution(state_resolution(config))
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `path`, or stdin when absent.
fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => read_file(path),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
