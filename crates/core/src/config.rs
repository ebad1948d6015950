//! Configuration management
//!
//! This module handles loading, saving, and migrating the tubedrop configuration file.
//! The configuration file is stored in TOML format at ~/.config/tubedrop/config.toml.
//!
//! Secrets are not part of this file; see [`crate::secrets`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::DEFAULT_UPLOAD_PREFIX;

/// Current configuration schema version
///
/// Bumping this version requires a migration step in [`ConfigManager::load`].
pub const SCHEMA_VERSION: u32 = 1;

const DEFAULT_AUDIO_FORMAT: &str = "mp3";
const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s-%(id)s.%(ext)s";
const DEFAULT_OAUTH_URL: &str = "https://api.dropbox.com";
const DEFAULT_API_URL: &str = "https://api.dropboxapi.com";
const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    #[serde(default)]
    pub downloader: DownloaderSettings,

    #[serde(default)]
    pub dropbox: DropboxSettings,
}

/// Settings for the external download tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderSettings {
    /// Directory containing the yt-dlp executable; PATH lookup when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yt_dlp_dir: Option<PathBuf>,

    /// Audio format for audio-only downloads
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Output file name template
    #[serde(default = "default_output_template")]
    pub output_template: String,
}

/// Settings for the Dropbox publish target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxSettings {
    /// Remote folder uploads land in
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,

    /// OAuth2 token endpoint host
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,

    /// RPC endpoint host (metadata, sharing)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Content endpoint host (upload)
    #[serde(default = "default_content_url")]
    pub content_url: String,

    /// Network timeouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

/// Timeout configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Whole-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,
}

fn default_audio_format() -> String {
    DEFAULT_AUDIO_FORMAT.to_string()
}

fn default_output_template() -> String {
    DEFAULT_OUTPUT_TEMPLATE.to_string()
}

fn default_upload_prefix() -> String {
    DEFAULT_UPLOAD_PREFIX.to_string()
}

fn default_oauth_url() -> String {
    DEFAULT_OAUTH_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_content_url() -> String {
    DEFAULT_CONTENT_URL.to_string()
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_request_timeout() -> u64 {
    600_000
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            yt_dlp_dir: None,
            audio_format: default_audio_format(),
            output_template: default_output_template(),
        }
    }
}

impl Default for DropboxSettings {
    fn default() -> Self {
        Self {
            upload_prefix: default_upload_prefix(),
            oauth_url: default_oauth_url(),
            api_url: default_api_url(),
            content_url: default_content_url(),
            timeout: None,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            request_ms: default_request_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            downloader: DownloaderSettings::default(),
            dropbox: DropboxSettings::default(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        Ok(Self::in_dir(&config_dir.join("tubedrop")))
    }

    /// Create a ConfigManager for `config.toml` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::with_path(dir.join("config.toml"))
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade tubedrop.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::in_dir(temp_dir.path());
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.downloader.audio_format, "mp3");
        assert_eq!(
            config.downloader.output_template,
            "%(title)s-%(id)s.%(ext)s"
        );
        assert!(config.downloader.yt_dlp_dir.is_none());
        assert_eq!(config.dropbox.upload_prefix, "/downloads");
        assert_eq!(config.dropbox.content_url, "https://content.dropboxapi.com");
        assert!(config.dropbox.timeout.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.downloader.yt_dlp_dir = Some(PathBuf::from("/opt/yt-dlp"));
        config.downloader.audio_format = "m4a".to_string();
        config.dropbox.upload_prefix = "/media".to_string();
        config.dropbox.timeout = Some(TimeoutConfig::default());

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.downloader.yt_dlp_dir, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(loaded.downloader.audio_format, "m4a");
        assert_eq!(loaded.dropbox.upload_prefix, "/media");
        assert_eq!(loaded.dropbox.timeout.unwrap().request_ms, 600_000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            r#"
            schema_version = 1

            [downloader]
            audio_format = "opus"
            "#,
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.downloader.audio_format, "opus");
        assert_eq!(
            config.downloader.output_template,
            "%(title)s-%(id)s.%(ext)s"
        );
        assert_eq!(config.dropbox.api_url, "https://api.dropboxapi.com");
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!(
            r#"
            schema_version = {}
            "#,
            SCHEMA_VERSION + 1
        );
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("newer than supported")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_save_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (manager, _temp_dir) = temp_config_manager();
        manager.save(&Config::default()).unwrap();

        let mode = std::fs::metadata(manager.config_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
