use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::file::FileLimits;
use crate::state::ChatMode;
use crate::transfer::UploadFailurePolicy;

pub const BASE_URL_ENV: &str = "DOCCHAT_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub default_mode: ChatMode,
    pub upload_failure_policy: UploadFailurePolicy,
    pub settle_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: Option<u64>,
    pub accepted_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_mode: ChatMode::Rag,
            upload_failure_policy: UploadFailurePolicy::Mask,
            settle_delay_ms: 800,
            request_timeout_secs: 120,
            max_upload_bytes: Some(DEFAULT_MAX_UPLOAD_BYTES),
            accepted_extensions: Vec::new(),
        }
    }

    /// Load the user's config file, falling back to defaults when it doesn't
    /// exist, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Persist only the chat mode, leaving every other field on disk untouched
    pub fn save_default_mode(mode: ChatMode) -> Result<(), ConfigError> {
        Self::save_default_mode_to(&Self::get_config_path()?, mode)
    }

    /// A file that doesn't parse is left alone and reported
    pub fn save_default_mode_to(path: &Path, mode: ChatMode) -> Result<(), ConfigError> {
        let mut config = Self::load_from(path)?;
        config.default_mode = mode;
        config.save_to(path)
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn file_limits(&self) -> FileLimits {
        FileLimits {
            max_upload_bytes: self.max_upload_bytes,
            accepted_extensions: self
                .accepted_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("docchat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.default_mode, ChatMode::Rag);
        assert_eq!(config.upload_failure_policy, UploadFailurePolicy::Mask);
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.base_url = "http://qa.internal:9000".to_string();
        config.default_mode = ChatMode::FileOnly;
        config.upload_failure_policy = UploadFailurePolicy::Report;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "base_url": "http://example.test" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://example.test");
        assert_eq!(config.settle_delay_ms, 800);
        assert_eq!(config.max_upload_bytes, Some(DEFAULT_MAX_UPLOAD_BYTES));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn saving_mode_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "base_url": "http://my-server:9000" }"#).unwrap();

        Config::save_default_mode_to(&path, ChatMode::FileOnly).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://my-server:9000");
        assert_eq!(config.default_mode, ChatMode::FileOnly);
    }

    #[test]
    fn saving_mode_leaves_malformed_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let original = r#"{"base_url":"http://my-server:9000",}"#;
        fs::write(&path, original).unwrap();

        let result = Config::save_default_mode_to(&path, ChatMode::FileOnly);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn file_limits_normalize_extensions() {
        let mut config = Config::new();
        config.accepted_extensions = vec![".PDF".to_string(), "txt".to_string()];
        let limits = config.file_limits();
        assert_eq!(limits.accepted_extensions, vec!["pdf", "txt"]);
    }
}
