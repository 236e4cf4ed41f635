//! Schema editor settings
//!
//! [`EditorConfig::load`] reads the `[schema_editor]` section of
//! `config/db2.toml` and then `LIFEGUARD_DB2__SCHEMA_EDITOR__*` environment
//! variables, falling back to environment variables only when the file can't
//! be read. A missing section yields the defaults.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

const CONFIG_FILE: &str = "config/db2.toml";
const ENV_PREFIX: &str = "LIFEGUARD_DB2";
const SECTION: &str = "schema_editor";

/// Shortest identifier limit that still leaves room for a digest and suffix
const MIN_NAME_LENGTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditorConfig {
    /// Maximum identifier length of the target engine
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Prefix of the temporary column used when a column is remade
    #[serde(default = "default_pseudo_column_prefix")]
    pub pseudo_column_prefix: String,
    /// `CACHE` value of generated identity clauses
    #[serde(default = "default_identity_cache")]
    pub identity_cache: u32,
    /// Reorganize reorg-pending tables between steps
    #[serde(default = "default_auto_reorg")]
    pub auto_reorg: bool,
}

fn default_max_name_length() -> usize {
    128
}

fn default_pseudo_column_prefix() -> String {
    "pseudo_".to_string()
}

fn default_identity_cache() -> u32 {
    10
}

fn default_auto_reorg() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_name_length: default_max_name_length(),
            pseudo_column_prefix: default_pseudo_column_prefix(),
            identity_cache: default_identity_cache(),
            auto_reorg: default_auto_reorg(),
        }
    }
}

impl EditorConfig {
    /// Load from `config/db2.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {}, falling back to env: {}", CONFIG_FILE, err);
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        Self::from_settings(&settings)
    }

    /// Load from an explicit TOML file; the file must exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml).required(true))
            .build()?;
        Self::from_settings(&settings)
    }

    /// Parse TOML text containing a `[schema_editor]` section
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        let config = match settings.get::<EditorConfig>(SECTION) {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => EditorConfig::default(),
            Err(e) => {
                return Err(ConfigError::Message(format!(
                    "Schema editor configuration could not be loaded: {}",
                    e
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_name_length < MIN_NAME_LENGTH {
            return Err(ConfigError::Message(format!(
                "max_name_length must be at least {}, got {}",
                MIN_NAME_LENGTH, self.max_name_length
            )));
        }
        if self.pseudo_column_prefix.is_empty() {
            return Err(ConfigError::Message("pseudo_column_prefix must not be empty".into()));
        }
        Ok(())
    }
}
