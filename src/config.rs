use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::resolver::{DEFAULT_DELAY, DEFAULT_MAX_RETRIES, RetryPolicy};

pub const DEFAULT_CONFIG_FILE: &str = "kira-taxlineage.json";
pub const DEFAULT_DATASETS_BIN: &str = "datasets";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub delay_secs: Option<f64>,
    #[serde(default)]
    pub datasets_bin: Option<String>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_retries: Option<u32>,
    pub delay_secs: Option<f64>,
    pub datasets_bin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub policy: RetryPolicy,
    pub datasets_bin: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-taxlineage.json` from the current directory when
    /// it exists. An explicit path that cannot be read is an error.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, TaxError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| TaxError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| TaxError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, TaxError> {
        let schema_version = config.schema_version.unwrap_or(SCHEMA_VERSION);
        if schema_version != SCHEMA_VERSION {
            return Err(TaxError::ConfigParse(format!(
                "unsupported schema_version: {schema_version}"
            )));
        }
        let max_retries = overrides
            .max_retries
            .or(config.max_retries)
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let delay = match overrides.delay_secs.or(config.delay_secs) {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| TaxError::ConfigParse(format!("invalid delay_secs: {secs}")))?,
            None => DEFAULT_DELAY,
        };
        let datasets_bin = overrides
            .datasets_bin
            .or(config.datasets_bin)
            .unwrap_or_else(|| DEFAULT_DATASETS_BIN.to_string());

        Ok(ResolvedConfig {
            policy: RetryPolicy { max_retries, delay },
            datasets_bin,
        })
    }
}
