use crate::models::PlatformPair;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Lowest bcrypt cost accepted for address hashing.
pub const MIN_HASH_COST: u32 = 4;
/// Highest bcrypt cost accepted for address hashing.
pub const MAX_HASH_COST: u32 = 31;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Database pool configuration
    pub database: DatabaseConfig,

    /// Pipeline concurrency and hashing
    pub processing: ProcessingConfig,

    /// Directory scan configuration
    pub discovery: DiscoveryConfig,

    /// Platform markers
    pub platforms: PlatformPair,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub credentials_file: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Upper bound on concurrent row writes per platform
    pub max_in_flight_writes: usize,
    /// bcrypt cost used for address hashing
    pub hash_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Substring a file name must contain to be picked up by `--all`
    pub name_contains: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("database.json"),
            max_connections: 80,
            acquire_timeout_secs: 30,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_in_flight_writes: 64,
            hash_cost: MIN_HASH_COST,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            name_contains: "localhost_access_log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file (explicit or discovered), environment and defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::discover_file()
                .map(|path| Self::load_from_file(&path))
                .transpose()?
                .unwrap_or_default(),
        };

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    fn discover_file() -> Option<PathBuf> {
        let config_paths = [
            PathBuf::from("access-usage.toml"),
            PathBuf::from(".access-usage.toml"),
            dirs::config_dir()
                .map(|d| d.join("access-usage").join("config.toml"))
                .unwrap_or_default(),
        ];

        config_paths.into_iter().find(|path| path.is_file())
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(config_file = %path.display(), "Loaded configuration from file");
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }
        if let Ok(val) = env::var("ACCESS_USAGE_LOG_DIR") {
            self.logging.directory = PathBuf::from(val);
        }

        // Database overrides
        if let Ok(val) = env::var("ACCESS_USAGE_CREDENTIALS") {
            self.database.credentials_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("ACCESS_USAGE_MAX_CONNECTIONS") {
            self.database.max_connections = val
                .parse()
                .context("Invalid ACCESS_USAGE_MAX_CONNECTIONS")?;
        }

        // Processing overrides
        if let Ok(val) = env::var("ACCESS_USAGE_MAX_IN_FLIGHT") {
            self.processing.max_in_flight_writes = val
                .parse()
                .context("Invalid ACCESS_USAGE_MAX_IN_FLIGHT")?;
        }
        if let Ok(val) = env::var("ACCESS_USAGE_HASH_COST") {
            self.processing.hash_cost = val.parse().context("Invalid ACCESS_USAGE_HASH_COST")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            anyhow::bail!("Max connections must be greater than 0");
        }

        if self.processing.max_in_flight_writes == 0 {
            anyhow::bail!("Max in-flight writes must be greater than 0");
        }

        if self.processing.max_in_flight_writes > self.database.max_connections as usize {
            warn!(
                max_in_flight_writes = self.processing.max_in_flight_writes,
                max_connections = self.database.max_connections,
                "In-flight writes exceed pool size, writes will queue for connections"
            );
        }

        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.processing.hash_cost) {
            anyhow::bail!(
                "Hash cost must be between {} and {}, got {}",
                MIN_HASH_COST,
                MAX_HASH_COST,
                self.processing.hash_cost
            );
        }

        let (first, second) = (&self.platforms.first, &self.platforms.second);
        if first.marker.is_empty() || second.marker.is_empty() {
            anyhow::bail!("Platform markers cannot be empty");
        }
        if first.marker == second.marker || first.tag == second.tag {
            anyhow::bail!("Platforms must have distinct tags and markers");
        }

        // Create the log directory only when logs go to a file
        if matches!(self.logging.output.as_str(), "file" | "both")
            && !self.logging.directory.exists()
        {
            fs::create_dir_all(&self.logging.directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }
}

/// Connection details read from the JSON credentials file
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseCredentials {
    #[serde(alias = "URL", alias = "Url")]
    pub url: String,
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
    #[serde(alias = "Dbname", alias = "DBName")]
    pub dbname: String,
}

impl std::fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .finish()
    }
}

impl DatabaseCredentials {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", path.display()))
    }

    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}/{}?sslmode=disable",
            self.username, self.password, self.url, self.dbname
        )
    }
}
