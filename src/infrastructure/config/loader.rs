use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{CommandConfig, Config};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_ncpus: {0}. Must be at least 1")]
    InvalidMaxNcpus(usize),

    #[error("Work root cannot be empty")]
    EmptyWorkRoot,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Reference code cannot be empty")]
    EmptyReferenceCode,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .dojo/config.yaml (project config)
    /// 3. .dojo/local.yaml (project local overrides, optional)
    /// 4. Environment variables (DOJO_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".dojo/config.yaml"))
            .merge(Yaml::file(".dojo/local.yaml"))
            .merge(Env::prefixed("DOJO_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring `DOJO_*`
    /// environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("DOJO_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.max_ncpus == 0 {
            return Err(ConfigError::InvalidMaxNcpus(config.max_ncpus));
        }

        if config.work_root.trim().is_empty() {
            return Err(ConfigError::EmptyWorkRoot);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.reference.code.is_empty() {
            return Err(ConfigError::EmptyReferenceCode);
        }

        for (trial, command) in [
            ("hints", &config.workflows.hints),
            ("delta_factor", &config.workflows.delta_factor),
        ] {
            Self::validate_command(trial, command)?;
        }

        Ok(())
    }

    fn validate_command(trial: &str, command: &CommandConfig) -> Result<(), ConfigError> {
        if command.is_configured() && command.results_file.is_empty() {
            return Err(ConfigError::ValidationFailed(format!(
                "workflow '{trial}' results_file cannot be empty"
            )));
        }
        if !command.is_configured() && !command.args.is_empty() {
            return Err(ConfigError::ValidationFailed(format!(
                "workflow '{trial}' has args but no program"
            )));
        }
        Ok(())
    }
}
