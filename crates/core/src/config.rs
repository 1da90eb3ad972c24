//! Configuration management for yadisk
//!
//! The OAuth token is absent from every structure here. It is supplied per
//! process (flag or environment) and never written to disk.

use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Public REST endpoint
pub const API_BASE_URL: &str = "https://cloud-api.yandex.net/v1/disk";

/// Configuration directory name
const CONFIG_DIR: &str = "yadisk";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Settings fixed at client construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended verbatim
    pub base_url: String,
    /// Overall per-request timeout in seconds, applied to every request
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Skip TLS certificate verification.
    ///
    /// Only for test proxies or intercepting setups you control. Never
    /// enable it against the public API.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            accept_invalid_certs: false,
            user_agent: format!("yadisk-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Point the client at another API root (mock servers, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiConfig,
    pub logging: Option<LoggingConfig>,
    pub output: Option<OutputConfig>,
}

/// API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            accept_invalid_certs: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub default_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: default_output_format(),
        }
    }
}

impl ConfigFile {
    /// Client settings derived from the `[api]` section
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout_secs: self.api.timeout,
            connect_timeout_secs: self.api.connect_timeout,
            accept_invalid_certs: self.api.accept_invalid_certs,
            ..ClientConfig::default()
        }
    }
}

// Default values
fn default_base_url() -> String {
    API_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_output_format() -> String {
    "table".to_string()
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from file
pub fn load_config() -> Result<ConfigFile> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(Error::ConfigNotFound(config_path));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    parse_config(&content)
}

/// Load configuration, falling back to defaults when no file exists
pub fn load_config_or_default() -> Result<ConfigFile> {
    match load_config() {
        Err(Error::ConfigNotFound(_)) => Ok(ConfigFile::default()),
        other => other,
    }
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    toml::from_str(content)
        .map_err(|e| Error::InvalidConfig(format!("Failed to parse config file: {}", e)))
}

/// Save configuration to file
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    fs::create_dir_all(&config_dir)
        .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;

    let config_path = config_dir.join(CONFIG_FILE);

    let content = toml::to_string_pretty(config).map_err(|e| {
        Error::InvalidConfig(format!("Failed to serialize config: {}", e))
    })?;

    fs::write(&config_path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&config_path, perms)
            .map_err(|e| Error::Config(format!("Failed to set permissions: {}", e)))?;
    }

    Ok(config_path)
}

/// Validate configuration
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    let base_url = &config.api.base_url;
    if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
        return Err(Error::InvalidInput(format!(
            "base_url must start with http:// or https:// (got '{}')",
            base_url
        )));
    }

    if config.api.timeout == 0 {
        return Err(Error::InvalidInput("timeout must be at least 1 second".to_string()));
    }

    if let Some(logging) = &config.logging {
        if !matches!(logging.level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(Error::InvalidInput(format!(
                "Unknown log level '{}'",
                logging.level
            )));
        }
        if !matches!(logging.format.as_str(), "pretty" | "compact") {
            return Err(Error::InvalidInput(format!(
                "Unknown log format '{}' (expected pretty or compact)",
                logging.format
            )));
        }
    }

    if let Some(output) = &config.output {
        if !matches!(output.default_format.as_str(), "table" | "json") {
            return Err(Error::InvalidInput(format!(
                "Unknown output format '{}' (expected table or json)",
                output.default_format
            )));
        }
    }

    Ok(())
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.api.base_url, API_BASE_URL);
        assert_eq!(config.api.timeout, 30);
        assert!(!config.api.accept_invalid_certs);
        assert!(config.logging.is_none());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_full_file() {
        let config = parse_config(
            r#"
            [api]
            base_url = "http://localhost:8080/v1/disk"
            timeout = 5
            accept_invalid_certs = true

            [logging]
            level = "debug"

            [output]
            default_format = "json"
            "#,
        )
        .unwrap();

        let client = config.client_config();
        assert_eq!(client.base_url, "http://localhost:8080/v1/disk");
        assert_eq!(client.timeout_secs, 5);
        assert_eq!(client.connect_timeout_secs, 10);
        assert!(client.accept_invalid_certs);
        assert_eq!(config.logging.unwrap().format, "pretty");
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(matches!(
            parse_config("[api\nbase_url ="),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_config_bad_scheme() {
        let mut config = ConfigFile::default();
        config.api.base_url = "ftp://cloud-api.yandex.net".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_unknown_log_format() {
        let config = ConfigFile {
            logging: Some(LoggingConfig {
                level: "info".to_string(),
                format: "xml".to_string(),
            }),
            ..ConfigFile::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_zero_timeout() {
        let mut config = ConfigFile::default();
        config.api.timeout = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_log_level() {
        let mut config = ConfigFile::default();
        config.logging = Some(LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_output_format() {
        let mut config = ConfigFile::default();
        config.output = Some(OutputConfig {
            default_format: "xml".to_string(),
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, API_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.accept_invalid_certs);
        assert!(config.user_agent.starts_with("yadisk-rs/"));

        let config = config.with_base_url("http://127.0.0.1:1").with_timeout(2);
        assert_eq!(config.base_url, "http://127.0.0.1:1");
        assert_eq!(config.timeout_secs, 2);
    }
}
