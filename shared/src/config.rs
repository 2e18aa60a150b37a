use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "interns";
pub const DEFAULT_COLLECTION_ID: &str = "INTERN";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("STORE_TIMEOUT_MS must be a whole number of milliseconds, got {0:?}")]
    InvalidTimeout(String),

    #[error("Unknown STORE_BACKEND {0:?} (expected dynamodb or memory)")]
    UnknownBackend(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    DynamoDb,
    /// Process-local; data is gone when the instance is recycled
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(Self::DynamoDb),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::UnknownBackend(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    /// Partition key value of every intern item
    pub collection_id: String,
    pub store_timeout: Duration,
    pub backend: StoreBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            collection_id: DEFAULT_COLLECTION_ID.to_string(),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            backend: StoreBackend::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset and empty values take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let store_timeout = match get("STORE_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => defaults.store_timeout,
        };

        let backend = match get("STORE_BACKEND") {
            Some(raw) => raw.trim().parse()?,
            None => defaults.backend,
        };

        Ok(Self {
            table_name: get("TABLE_NAME").unwrap_or(defaults.table_name),
            collection_id: get("COLLECTION_ID").unwrap_or(defaults.collection_id),
            store_timeout,
            backend,
        })
    }
}
