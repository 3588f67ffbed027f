//! Configuration management for WPI.
//!
//! Parses `wpi.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `directives.default_namespace`
//! - `store.seed` entries

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override state resolution mode.
    pub state_resolution: Option<StateResolutionMode>,
    /// Override default namespace.
    pub default_namespace: Option<String>,
    /// Extra store seed files, merged after the configured ones.
    pub store_seeds: Vec<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wpi.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directive processing configuration.
    pub directives: DirectivesConfig,
    /// Store configuration (paths are relative strings from TOML).
    store: StoreConfigRaw,

    /// Store seed files resolved against the config directory (set after
    /// loading).
    #[serde(skip)]
    pub store_seeds: Vec<PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// How `state.*` references find their root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateResolutionMode {
    /// Walk the whole store from its top-level keys.
    #[default]
    Global,
    /// Walk the store entry of the active `interactive` namespace.
    Namespace,
}

/// Directive processing configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectivesConfig {
    /// State resolution mode.
    ///
    /// Default: `global`
    pub state_resolution: StateResolutionMode,
    /// Namespace used outside any `interactive` scope in `namespace` mode.
    pub default_namespace: Option<String>,
}

/// Raw store configuration from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreConfigRaw {
    seed: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`store.seed`").
        field: String,
        /// Error message (e.g., "${`WPI_STATE`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wpi.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(mode) = settings.state_resolution {
            self.directives.state_resolution = mode;
        }
        if let Some(namespace) = &settings.default_namespace {
            self.directives.default_namespace = Some(namespace.clone());
        }
        self.store_seeds
            .extend(settings.store_seeds.iter().cloned());
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after applying CLI
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(namespace) = &self.directives.default_namespace
            && namespace.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "directives.default_namespace cannot be empty".to_owned(),
            ));
        }
        if let Some(empty) = self.store.seed.iter().position(String::is_empty) {
            return Err(ConfigError::Validation(format!(
                "store.seed[{empty}] cannot be empty"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref namespace) = self.directives.default_namespace {
            self.directives.default_namespace = Some(expand::expand_env(
                namespace,
                "directives.default_namespace",
            )?);
        }

        self.store.seed = self
            .store
            .seed
            .iter()
            .map(|seed| expand::expand_env(seed, "store.seed"))
            .collect::<Result<_, _>>()?;

        Ok(())
    }

    /// Resolve relative seed paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.store_seeds = self
            .store
            .seed
            .iter()
            .map(|seed| config_dir.join(seed))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.directives.state_resolution,
            StateResolutionMode::Global
        );
        assert!(config.directives.default_namespace.is_none());
        assert!(config.store_seeds.is_empty());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(
            config.directives.state_resolution,
            StateResolutionMode::Global
        );
    }

    #[test]
    fn test_parse_directives_config() {
        let toml = r#"
[directives]
state_resolution = "namespace"
default_namespace = "core"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.directives,
            DirectivesConfig {
                state_resolution: StateResolutionMode::Namespace,
                default_namespace: Some("core".to_owned()),
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let toml = r#"
[directives]
state_resolution = "nearest"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_load_resolves_seed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[store]
seed = ["state.json", "seeds/more.json"]
"#,
        );

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(
            config.store_seeds,
            vec![dir.path().join("state.json"), dir.path().join("seeds/more.json")]
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[directives\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_empty_default_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[directives]
default_namespace = ""
"#,
        );
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("directives.default_namespace"));
    }

    #[test]
    fn test_namespace_mode_without_default_is_valid() {
        let toml = r#"
[directives]
state_resolution = "namespace"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_seed() {
        let toml = r#"
[store]
seed = ["a.json", ""]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("store.seed[1]"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[directives]
default_namespace = "core"

[store]
seed = ["state.json"]
"#,
        );
        let settings = CliSettings {
            state_resolution: Some(StateResolutionMode::Namespace),
            default_namespace: Some("shop".to_owned()),
            store_seeds: vec![PathBuf::from("extra.json")],
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(
            config.directives.state_resolution,
            StateResolutionMode::Namespace
        );
        assert_eq!(config.directives.default_namespace.as_deref(), Some("shop"));
        assert_eq!(
            config.store_seeds,
            vec![dir.path().join("state.json"), PathBuf::from("extra.json")]
        );
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.directives, DirectivesConfig::default());
        assert!(config.store_seeds.is_empty());
    }

    #[test]
    fn test_cli_empty_default_namespace_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let settings = CliSettings {
            default_namespace: Some(String::new()),
            ..CliSettings::default()
        };
        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WPI_TEST_NAMESPACE", "shop");
            std::env::set_var("WPI_TEST_SEED_DIR", "fixtures");
        }

        let toml = r#"
[directives]
default_namespace = "${WPI_TEST_NAMESPACE}"

[store]
seed = ["${WPI_TEST_SEED_DIR}/state.json", "${WPI_TEST_SEED_UNSET:-base}.json"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve_paths(Path::new("/site"));

        assert_eq!(config.directives.default_namespace.as_deref(), Some("shop"));
        assert_eq!(
            config.store_seeds,
            vec![
                PathBuf::from("/site/fixtures/state.json"),
                PathBuf::from("/site/base.json")
            ]
        );

        unsafe {
            std::env::remove_var("WPI_TEST_NAMESPACE");
            std::env::remove_var("WPI_TEST_SEED_DIR");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("WPI_TEST_MISSING_SEED");
        }

        let toml = r#"
[store]
seed = ["${WPI_TEST_MISSING_SEED}"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("WPI_TEST_MISSING_SEED"));
        assert!(err.to_string().contains("store.seed"));
    }
}
