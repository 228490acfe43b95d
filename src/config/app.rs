//! Main application configuration
//!
//! This module defines the primary configuration structures for the squad-room
//! service, including environment variable and TOML file loading and validation.

use crate::config::formation::FormationConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub formation: FormationConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interval between scheduled formation passes in milliseconds
    pub pass_interval_ms: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "squad-room".to_string(),
            log_level: "info".to_string(),
            pass_interval_ms: 1000,
            shutdown_timeout_seconds: 30,
        }
    }
}

/// Read and parse an environment variable, leaving `target` untouched when unset
fn parse_env<T>(key: &str, target: &mut T) -> Result<()>
where
    T: std::str::FromStr,
{
    if let Ok(raw) = env::var(key) {
        *target = raw
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, raw))?;
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing fields take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| anyhow!("Invalid TOML configuration: {}", e))?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        parse_env("PASS_INTERVAL_MS", &mut self.service.pass_interval_ms)?;
        parse_env(
            "SHUTDOWN_TIMEOUT_SECONDS",
            &mut self.service.shutdown_timeout_seconds,
        )?;

        // Formation settings
        let formation = &mut self.formation;
        parse_env("TEAM_SIZE", &mut formation.team_size)?;
        parse_env(
            "MAX_CANDIDATES_PER_TEAM",
            &mut formation.max_candidates_per_team,
        )?;
        parse_env("SKILL_WEIGHT", &mut formation.scoring.skill_weight)?;
        parse_env("LATENCY_WEIGHT", &mut formation.scoring.latency_weight)?;
        parse_env("WAIT_WEIGHT", &mut formation.scoring.wait_weight)?;
        parse_env("SKILL_NORM", &mut formation.scoring.skill_norm)?;
        parse_env("LATENCY_NORM", &mut formation.scoring.latency_norm)?;
        parse_env("WAIT_NORM", &mut formation.scoring.wait_norm)?;
        parse_env("DUPLICATE_POLICY", &mut formation.duplicate_policy)?;

        Ok(())
    }

    /// Get pass interval as Duration
    pub fn pass_interval(&self) -> Duration {
        Duration::from_millis(self.service.pass_interval_ms)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.pass_interval_ms == 0 {
        return Err(anyhow!("Pass interval must be greater than 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    config.formation.validate()
}
