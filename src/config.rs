// Configuration File Support
//
// TOML configuration for the reply assistant with environment variable
// overrides. The default file lives in the platform config directory,
// e.g. ~/.config/reply-assistant/config.toml on Linux.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consent::ConsentConfig;
use crate::gateway::ApiConfig;
use crate::logging::LoggingConfig;
use crate::rate_limit::RateLimitConfig;
use crate::service::{ReplyConfig, ServiceConfig};
use crate::tone::ToneMode;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Completion API endpoint and generation parameters
    pub api: ApiConfig,

    /// Local request caps
    pub rate_limit: RateLimitConfig,

    /// Consent policy
    pub consent: ConsentConfig,

    /// Reply policy (tone mode, input floor)
    pub reply: ReplyConfig,

    /// Persistent key-value store
    pub storage: StorageConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding consent, credential and request ledger
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "reply-assistant", "ReplyAssistant")
}

fn home_fallback(parts: &[&str]) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    parts.iter().fold(PathBuf::from(home), |path, part| path.join(part))
}

fn default_store_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.data_dir().join("store.json"),
        None => home_fallback(&[".local", "share", "reply-assistant", "store.json"]),
    }
}

impl Config {
    /// Load configuration from the default config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment overrides are applied on top of the file (or the defaults
    /// when the file does not exist), then the result is validated.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::debug!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        match project_dirs() {
            Some(dirs) => dirs.config_dir().join("config.toml"),
            None => home_fallback(&[".config", "reply-assistant", "config.toml"]),
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - REPLY_ASSISTANT_LOG_LEVEL
    /// - REPLY_ASSISTANT_LOG_FORMAT
    /// - REPLY_ASSISTANT_API_BASE_URL
    /// - REPLY_ASSISTANT_MODEL
    /// - REPLY_ASSISTANT_RATE_LIMIT_ENABLED
    /// - REPLY_ASSISTANT_MINUTE_CAP
    /// - REPLY_ASSISTANT_HOUR_CAP
    /// - REPLY_ASSISTANT_TONE_MODE
    /// - REPLY_ASSISTANT_STORE_PATH
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env_overrides(mut self) -> Self {
        self.logging.apply_env_overrides();

        if let Ok(url) = std::env::var("REPLY_ASSISTANT_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("REPLY_ASSISTANT_MODEL") {
            if !model.trim().is_empty() {
                self.api.model = model;
            }
        }

        self.rate_limit = self.rate_limit.apply_env_overrides();

        if let Ok(mode) = std::env::var("REPLY_ASSISTANT_TONE_MODE") {
            if let Ok(mode) = mode.parse::<ToneMode>() {
                self.reply.tone_mode = mode;
            }
        }

        if let Ok(path) = std::env::var("REPLY_ASSISTANT_STORE_PATH") {
            if !path.trim().is_empty() {
                self.storage.path = PathBuf::from(path);
            }
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.rate_limit.validate()?;

        if self.consent.validity_days == 0 {
            anyhow::bail!("Consent validity_days must be > 0");
        }
        if self.consent.policy_version.trim().is_empty() {
            anyhow::bail!("Consent policy_version must not be empty");
        }

        if self.reply.min_input_chars == 0 {
            anyhow::bail!("Reply min_input_chars must be > 0");
        }

        if self.storage.path.as_os_str().is_empty() {
            anyhow::bail!("Storage path must not be empty");
        }

        Ok(())
    }

    /// Settings for [`crate::service::EmailReplyService`]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            reply: self.reply.clone(),
            rate_limit: self.rate_limit.clone(),
            consent: self.consent.clone(),
            credential_prefix: self.api.credential_prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};
    use tempfile::NamedTempFile;

    const ENV_VARS: &[&str] = &[
        "REPLY_ASSISTANT_LOG_LEVEL",
        "REPLY_ASSISTANT_LOG_FORMAT",
        "REPLY_ASSISTANT_API_BASE_URL",
        "REPLY_ASSISTANT_MODEL",
        "REPLY_ASSISTANT_RATE_LIMIT_ENABLED",
        "REPLY_ASSISTANT_MINUTE_CAP",
        "REPLY_ASSISTANT_HOUR_CAP",
        "REPLY_ASSISTANT_TONE_MODE",
        "REPLY_ASSISTANT_STORE_PATH",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.api.model, "gpt-3.5-turbo");
        assert_eq!(config.rate_limit.minute_cap, 15);
        assert_eq!(config.rate_limit.hour_cap, 100);
        assert_eq!(config.consent.validity_days, 180);
        assert_eq!(config.reply.tone_mode, ToneMode::Full);
        assert_eq!(config.reply.min_input_chars, 10);
        assert!(config.storage.path.ends_with("store.json"));
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_caps() {
        let mut config = Config::default();
        config.rate_limit.minute_cap = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rate_limit.hour_cap = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_consent() {
        let mut config = Config::default();
        config.consent.validity_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_api() {
        let mut config = Config::default();
        config.api.credential_prefix = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.temperature = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_min_input() {
        let mut config = Config::default();
        config.reply.min_input_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension("nonexistent");
        assert!(Config::load_from_path(&path).is_ok());
    }

    #[test]
    fn test_load_valid_toml_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[logging]
level = "debug"
format = "json"

[api]
base_url = "http://localhost:8080/v1"
max_tokens = 300

[consent]
validity_days = 90
policy_version = "2.0"

[reply]
min_input_chars = 20

[storage]
path = "/tmp/reply-assistant/store.json"
"#;

        fs::write(temp_file.path(), toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.api.max_tokens, 300);
        assert_eq!(config.api.top_p, 1.0);
        assert_eq!(config.consent.validity_days, 90);
        assert_eq!(config.consent.policy_version, "2.0");
        assert_eq!(config.reply.min_input_chars, 20);
    }

    #[test]
    fn test_load_invalid_toml_config() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[logging\nlevel = \"debug\"\n").unwrap();
        assert!(Config::load_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_log_level() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(Config::load_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[consent]\nvalidity_days = 0\n").unwrap();
        assert!(Config::load_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        clear_env();

        std::env::set_var("REPLY_ASSISTANT_LOG_LEVEL", "debug");
        std::env::set_var("REPLY_ASSISTANT_LOG_FORMAT", "json");
        std::env::set_var("REPLY_ASSISTANT_API_BASE_URL", "http://127.0.0.1:9999/v1");
        std::env::set_var("REPLY_ASSISTANT_MODEL", "gpt-4o-mini");
        std::env::set_var("REPLY_ASSISTANT_MINUTE_CAP", "5");
        std::env::set_var("REPLY_ASSISTANT_HOUR_CAP", "50");
        std::env::set_var("REPLY_ASSISTANT_TONE_MODE", "restricted");
        std::env::set_var("REPLY_ASSISTANT_STORE_PATH", "/tmp/ra-store.json");

        let config = Config::default().apply_env_overrides();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.api.base_url, "http://127.0.0.1:9999/v1");
        assert_eq!(config.api.model, "gpt-4o-mini");
        assert_eq!(config.rate_limit.minute_cap, 5);
        assert_eq!(config.rate_limit.hour_cap, 50);
        assert_eq!(config.reply.tone_mode, ToneMode::Restricted);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/ra-store.json"));

        // Invalid values keep what was there
        std::env::set_var("REPLY_ASSISTANT_MINUTE_CAP", "zero");
        std::env::set_var("REPLY_ASSISTANT_TONE_MODE", "sarcastic");
        std::env::set_var("REPLY_ASSISTANT_LOG_LEVEL", "loud");

        let config = Config::default().apply_env_overrides();
        assert_eq!(config.rate_limit.minute_cap, 15);
        assert_eq!(config.reply.tone_mode, ToneMode::Full);
        assert_eq!(config.logging.level, LogLevel::Info);

        clear_env();
    }

    #[test]
    fn test_service_config() {
        let mut config = Config::default();
        config.api.credential_prefix = "key-".to_string();
        config.reply.tone_mode = ToneMode::Restricted;

        let service = config.service_config();
        assert_eq!(service.credential_prefix, "key-");
        assert_eq!(service.reply.tone_mode, ToneMode::Restricted);
        assert_eq!(service.rate_limit, config.rate_limit);
    }

    #[test]
    fn test_config_path() {
        assert!(Config::config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
