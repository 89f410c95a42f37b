//! Layered Settings

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use data_validator::ValidationConfig;
use reporting::ReportConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

pub const ENV_PREFIX: &str = "PARKING";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<Level> {
        Level::from_str(&self.level)
            .map_err(|_| anyhow::anyhow!("invalid log level {:?}", self.level))
    }
}

/// All settings for one run
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub validation: ValidationConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Defaults, then `file` if given, then `PARKING__*` variables from the
    /// process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_from(file, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when it is `Some`.
    pub fn load_from(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.validation.validate().context("Invalid validation settings")?;
        self.report.validate().context("Invalid report settings")?;
        self.logging.max_level()?;
        Ok(())
    }
}
