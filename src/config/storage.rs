//! Storage configuration.

use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use url::Url;

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process storage; counters are lost on restart.
    Memory,
    /// JSON files under a data directory (single node).
    #[default]
    File,
    /// Redis storage (shared between workers).
    Redis,
    /// `MySQL` storage.
    #[serde(rename = "mysql")]
    MySQL,
    /// `PostgreSQL` storage.
    #[serde(rename = "postgresql")]
    PostgreSQL,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
            Self::Redis => write!(f, "redis"),
            Self::MySQL => write!(f, "mysql"),
            Self::PostgreSQL => write!(f, "postgresql"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type.
    #[serde(default)]
    pub backend: StorageBackend,

    /// File storage configuration.
    #[serde(default)]
    pub file: FileStorageConfig,

    /// Redis storage configuration.
    #[serde(default)]
    pub redis: RedisStorageConfig,

    /// `MySQL` storage configuration.
    #[serde(default)]
    pub mysql: SqlStorageConfig,

    /// `PostgreSQL` storage configuration.
    #[serde(default)]
    pub postgresql: SqlStorageConfig,
}

impl StorageConfig {
    /// Validate the storage configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected backend is missing its connection URL,
    /// the URL does not parse, or its scheme does not match the backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            StorageBackend::Memory => Ok(()),
            StorageBackend::File => {
                if self.file.data_dir.as_os_str().is_empty() {
                    return Err(ConfigError::Message(
                        "storage.file.data_dir cannot be empty".to_string(),
                    ));
                }
                Ok(())
            }
            StorageBackend::Redis => {
                validate_url("storage.redis.url", &self.redis.url, &["redis", "rediss"])?;
                if self.redis.pool_size == 0 {
                    return Err(ConfigError::Message(
                        "storage.redis.pool_size cannot be 0".to_string(),
                    ));
                }
                Ok(())
            }
            StorageBackend::MySQL => {
                validate_url("storage.mysql.url", &self.mysql.url, &["mysql", "mariadb"])?;
                self.mysql.validate("storage.mysql")
            }
            StorageBackend::PostgreSQL => {
                validate_url(
                    "storage.postgresql.url",
                    &self.postgresql.url,
                    &["postgres", "postgresql"],
                )?;
                self.postgresql.validate("storage.postgresql")
            }
        }
    }
}

fn validate_url(key: &str, raw: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::Message(format!("{key} cannot be empty")));
    }
    let url = Url::parse(raw).map_err(|e| ConfigError::Message(format!("{key}: {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::Message(format!(
            "{key}: unsupported scheme '{}' (expected one of {})",
            url.scheme(),
            schemes.join(", ")
        )));
    }
    Ok(())
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FileStorageConfig {
    /// Directory for storing data files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Redis storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisStorageConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Prefix prepended to every key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

const fn default_pool_size() -> usize {
    10
}

fn default_key_prefix() -> String {
    "customid:".to_string()
}

const fn default_connect_timeout() -> u64 {
    5
}

impl Default for RedisStorageConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            pool_size: default_pool_size(),
            key_prefix: default_key_prefix(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// SQL (`MySQL` / `PostgreSQL`) storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SqlStorageConfig {
    /// Connection URL.
    #[serde(default)]
    pub url: String,

    /// Connection pool minimum size.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection pool maximum size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_max_connections() -> u32 {
    10
}

impl SqlStorageConfig {
    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Message(format!(
                "{key}.max_connections cannot be 0"
            )));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Message(format!(
                "{key}.min_connections cannot exceed max_connections"
            )));
        }
        Ok(())
    }
}

impl Default for SqlStorageConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
        }
    }
}
