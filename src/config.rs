use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Relative location of the settings file inside the working directory.
pub const SETTINGS_FILE: &str = "config/console.toml";

/// Overrides `api.base_url` when set.
pub const ENV_API_URL: &str = "DISTRIBUTO_API_URL";
/// Overrides `logging.level` when set.
pub const ENV_LOG_LEVEL: &str = "DISTRIBUTO_LOG";

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top level console settings, usually read from `config/console.toml`.
///
/// Every section is optional in the file; missing values fall back to the
/// defaults below so a fresh checkout runs against a local backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsoleSettings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the REST backend lives and how long a single request may take.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Zero disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// File holding the persisted bearer credential.
    #[serde(default)]
    pub credential_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_log_level() -> String {
    String::from("info")
}

impl ConsoleSettings {
    /// Reads `config/console.toml` below `workspace_root`, falling back to
    /// defaults when the file does not exist. Environment overrides are
    /// applied afterwards.
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let config_path = workspace_root.join(SETTINGS_FILE);
        let settings = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read settings: {}", config_path.display()))?;
            Self::parse(&raw)
                .with_context(|| format!("failed to parse settings: {}", config_path.display()))?
        } else {
            Self::default()
        };
        Ok(settings.with_env_overrides())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: ConsoleSettings = toml::from_str(raw)?;
        Ok(parsed)
    }

    /// Writes the settings to `config/console.toml` below `workspace_root`.
    pub fn save_to_file(&self, workspace_root: &Path) -> Result<()> {
        let config_path = workspace_root.join(SETTINGS_FILE);
        if let Some(dir) = config_path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create config dir: {}", dir.display()))?;
        }
        let serialized = toml::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(&config_path, serialized)
            .with_context(|| format!("failed to write settings: {}", config_path.display()))?;
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(ENV_API_URL)
            && !url.trim().is_empty()
        {
            self.api.base_url = url.trim().to_string();
        }
        if let Ok(level) = env::var(ENV_LOG_LEVEL)
            && !level.trim().is_empty()
        {
            self.logging.level = level.trim().to_string();
        }
        self
    }

    /// Resolved credential file: the configured path or
    /// `<data dir>/distributo/credential`.
    pub fn credential_path(&self) -> PathBuf {
        self.session
            .credential_path
            .clone()
            .unwrap_or_else(|| data_dir().join("credential"))
    }

    /// Resolved log file: the configured path or `<data dir>/distributo/console.log`.
    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(|| data_dir().join("console.log"))
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("distributo")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = ConsoleSettings::parse("").unwrap();
        assert_eq!(settings.api.base_url, "http://localhost:5000");
        assert_eq!(settings.api.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let raw = r#"
            [api]
            base_url = "https://ops.example.com"

            [session]
            credential_path = "/tmp/distributo-token"
        "#;
        let settings = ConsoleSettings::parse(raw).unwrap();
        assert_eq!(settings.api.base_url, "https://ops.example.com");
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(
            settings.credential_path(),
            PathBuf::from("/tmp/distributo-token")
        );
    }

    #[test]
    fn zero_timeout_disables_it() {
        let settings = ConsoleSettings::parse("[api]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(settings.api.timeout(), None);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ConsoleSettings::default();
        settings.api.timeout_secs = 12;
        settings.logging.level = String::from("debug");
        settings.save_to_file(dir.path()).unwrap();

        let raw = fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        let loaded = ConsoleSettings::parse(&raw).unwrap();
        assert_eq!(loaded, settings);
    }
}
