use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::ledger::Commitment;
use crate::programs::HABIT_STAKE_ID;

pub const ENV_PREFIX: &str = "HABIT_STAKE__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub program_id: String,
    pub commitment: Commitment,
    pub confirm_attempts: u32,
    pub confirm_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".into(),
            program_id: HABIT_STAKE_ID.to_string(),
            commitment: Commitment::Confirmed,
            confirm_attempts: 30,
            confirm_interval_ms: 1_000,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Defaults, then the TOML file if given, then `HABIT_STAKE__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = lookup("PROGRAM_ID") {
            self.program_id = v;
        }
        if let Some(v) = lookup("COMMITMENT") {
            self.commitment = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "commitment",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("CONFIRM_ATTEMPTS") {
            self.confirm_attempts = parse_number("confirm_attempts", &v)?;
        }
        if let Some(v) = lookup("CONFIRM_INTERVAL_MS") {
            self.confirm_interval_ms = parse_number("confirm_interval_ms", &v)?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("request_timeout_secs", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.program_id()?;
        if self.confirm_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "confirm_attempts",
                value: "0".into(),
            });
        }
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "rpc_url",
                value: self.rpc_url.clone(),
            });
        }
        Ok(())
    }

    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        Pubkey::from_str(&self.program_id).map_err(|_| ConfigError::InvalidValue {
            key: "program_id",
            value: self.program_id.clone(),
        })
    }

    pub fn confirm_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_interval_ms)
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
