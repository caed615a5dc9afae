//! Configuration management for nipscan.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Command-line flags are applied on top by
//! the application shell.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default public proxy list (plain text, one `host:port` per line).
pub const DEFAULT_PROXY_SOURCE: &str =
    "https://raw.githubusercontent.com/TheSpeedX/SOCKS-List/master/http.txt";

/// Main application configuration.
///
/// This is loaded from `~/.config/nipscan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Discovery loop settings
    pub scan: ScanConfig,
    /// Registry lookup settings
    pub registry: RegistryConfig,
    /// Proxy rotation settings
    pub proxy: ProxyConfig,
    /// Telegram notification settings
    pub telegram: TelegramConfig,
    /// Result journal settings
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `NIPSCAN_TG_TOKEN`: Telegram bot token
    /// - `NIPSCAN_TG_CHAT`: Telegram chat id
    /// - `NIPSCAN_JOURNAL`: Path of the result journal
    /// - `NIPSCAN_CONCURRENCY`: Worker count
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("NIPSCAN_TG_TOKEN") {
            if !token.is_empty() {
                self.telegram.token = Some(token);
                tracing::debug!("Override telegram.token from env");
            }
        }

        if let Ok(chat) = std::env::var("NIPSCAN_TG_CHAT") {
            if !chat.is_empty() {
                tracing::debug!("Override telegram.chat_id from env: {}", chat);
                self.telegram.chat_id = Some(chat);
            }
        }

        if let Ok(path) = std::env::var("NIPSCAN_JOURNAL") {
            if !path.is_empty() {
                tracing::debug!("Override storage.journal_path from env: {}", path);
                self.storage.journal_path = PathBuf::from(path);
            }
        }

        if let Ok(val) = std::env::var("NIPSCAN_CONCURRENCY") {
            if let Ok(concurrency) = val.parse() {
                self.scan.concurrency = concurrency;
                tracing::debug!("Override scan.concurrency from env: {}", concurrency);
            }
        }
    }

    /// Check values that would make the discovery loop misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scan.concurrency == 0 {
            return Err(invalid("scan.concurrency", "must be at least 1"));
        }
        if self.scan.report_every == 0 {
            return Err(invalid("scan.report_every", "must be at least 1"));
        }
        if self.registry.timeout_secs == 0 {
            return Err(invalid("registry.timeout_secs", "must be at least 1"));
        }
        if self.proxy.enabled && self.proxy.source_url.trim().is_empty() {
            return Err(invalid(
                "proxy.source_url",
                "required when proxies are enabled",
            ));
        }
        Ok(())
    }

    /// Save configuration to the default path.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| invalid("config_path", "no parent directory"))?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/nipscan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "nipscan", "nipscan").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Discovery loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Total attempt budget across all workers (absent = run until interrupted)
    pub attempts: Option<u64>,
    /// Per-worker delay between attempts in milliseconds
    pub delay_ms: u64,
    /// Print a progress line every N attempts
    pub report_every: u64,
    /// Number of parallel workers
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            attempts: None,
            delay_ms: 300,
            report_every: 10,
            concurrency: 5,
        }
    }
}

/// Registry lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the registry API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wl-api.mf.gov.pl".to_string(),
            timeout_secs: 15,
            user_agent: format!("nipscan/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Proxy rotation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Route lookups through proxies from the source list
    pub enabled: bool,
    /// URL of the newline-delimited `host:port` list
    pub source_url: String,
    /// Timeout for fetching the list, in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_url: DEFAULT_PROXY_SOURCE.to_string(),
            fetch_timeout_secs: 15,
        }
    }
}

/// Telegram notification settings.
///
/// Notifications are sent only when both `token` and `chat_id` are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token
    pub token: Option<String>,
    /// Target chat id
    pub chat_id: Option<String>,
    /// Base URL of the Bot API
    pub api_base: String,
    /// Maximum number of queued, unsent notifications
    pub queue_capacity: usize,
}

impl TelegramConfig {
    /// Whether both credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!((&self.token, &self.chat_id), (Some(t), Some(c)) if !t.is_empty() && !c.is_empty())
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".to_string(),
            queue_capacity: 64,
        }
    }
}

/// Result journal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON array of confirmed results
    pub journal_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            journal_path: PathBuf::from("valid.json"),
        }
    }
}
