//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult};
use dca_core::{validate_plans, InvestmentPlan};
use dca_exchange::{DEFAULT_ENDPOINTS, DEFAULT_MAX_RETRIES};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exchange API key. `DCA_API_KEY` overrides.
    #[serde(default)]
    pub api_key: String,
    /// Exchange API secret. `DCA_API_SECRET` overrides.
    #[serde(default)]
    pub api_secret: String,
    /// Candidate base URLs, tried in rotation on transient failures.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    /// Directory for monthly trade-history files.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,
    /// Order retry budget per scheduled fire.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Recurring buy instructions.
    #[serde(default)]
    pub plans: Vec<InvestmentPlan>,
}

fn default_endpoints() -> Vec<String> {
    DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect()
}

fn default_history_dir() -> String {
    "trading_history".to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            endpoints: default_endpoints(),
            history_dir: default_history_dir(),
            max_retries: default_max_retries(),
            plans: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path resolution: explicit argument > `DCA_CONFIG` env var >
    /// `config/default.toml`. Env-var credential overrides are applied
    /// after parsing.
    pub fn load(cli_path: Option<String>) -> AppResult<Self> {
        let config_path = cli_path
            .or_else(|| std::env::var("DCA_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Err(AppError::Config(format!(
                "Config file not found: {config_path}"
            )));
        }

        let mut config = Self::from_file(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply `DCA_API_KEY` / `DCA_API_SECRET` overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("DCA_API_KEY") {
            debug!("Using API key from environment");
            self.api_key = key;
        }
        if let Ok(secret) = std::env::var("DCA_API_SECRET") {
            self.api_secret = secret;
        }
    }

    /// Validate the loaded configuration.
    ///
    /// Any failure here is fatal: the process must not start its
    /// scheduling loop with a malformed plan list or unusable
    /// credentials.
    pub fn validate(&self) -> AppResult<()> {
        if self.plans.is_empty() {
            return Err(AppError::Config("no plans configured".to_string()));
        }
        validate_plans(&self.plans)
            .map_err(|e| AppError::Config(format!("invalid schedule: {e}")))?;

        if self.endpoints.is_empty() {
            return Err(AppError::Config("no endpoints configured".to_string()));
        }
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(AppError::Config(
                "missing API credentials (set api_key/api_secret or DCA_API_KEY/DCA_API_SECRET)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
