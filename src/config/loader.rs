use crate::config::validation::{validate_config, ValidationError};
use crate::config::Config;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Prefix for environment overrides, e.g. `BIKE_PRICE_SESSION__SECRET`
pub const ENV_PREFIX: &str = "BIKE_PRICE_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Layers defaults, an optional TOML file and environment variables
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            path: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Read a TOML file; `~` is expanded
    pub fn with_file(mut self, path: impl AsRef<str>) -> Self {
        self.path = Some(PathBuf::from(shellexpand::tilde(path.as_ref()).to_string()));
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = &self.path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(&self.env_prefix).split("__"))
    }

    /// Extract and validate the configuration
    pub fn load(&self) -> Result<Config, ConfigError> {
        if let Some(path) = &self.path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            debug!(path = %path.display(), "Loading config file");
        }

        let config: Config = self.figment().extract().map_err(Box::new)?;
        validate_config(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
