use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AuraConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub insight: InsightConfig,
    pub editor: EditorConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InsightConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

/// Quiescence windows for the journal editor, in milliseconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EditorConfig {
    pub content_quiet_ms: u64,
    pub media_quiet_ms: u64,
    pub saved_linger_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_aura_dir()
            .join("journal.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            timeout_secs: 30,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            content_quiet_ms: 1500,
            media_quiet_ms: 500,
            saved_linger_ms: 2000,
        }
    }
}

impl InsightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Returns `~/.aura/`
pub fn default_aura_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aura")
}

/// Returns the default config file path: `~/.aura/config.toml`
pub fn default_config_path() -> PathBuf {
    default_aura_dir().join("config.toml")
}

impl AuraConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            AuraConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (AURA_DB, AURA_LOG_LEVEL, AURA_MODEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AURA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("AURA_LOG_LEVEL") {
            self.logging.log_level = val;
        }
        if let Ok(val) = std::env::var("AURA_MODEL") {
            self.insight.model = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AuraConfig::default();
        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.insight.provider, "gemini");
        assert_eq!(config.insight.model, "gemini-2.5-flash");
        assert_eq!(config.editor.content_quiet_ms, 1500);
        assert_eq!(config.editor.media_quiet_ms, 500);
        assert_eq!(config.editor.saved_linger_ms, 2000);
        assert!(config.storage.db_path.ends_with("journal.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[logging]
log_level = "debug"

[storage]
db_path = "/tmp/test-journal.db"

[editor]
content_quiet_ms = 800
"#;
        let config: AuraConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test-journal.db");
        assert_eq!(config.editor.content_quiet_ms, 800);
        // defaults still apply for unset fields
        assert_eq!(config.editor.media_quiet_ms, 500);
        assert_eq!(config.insight.timeout_secs, 30);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AuraConfig::default();
        std::env::set_var("AURA_DB", "/tmp/override.db");
        std::env::set_var("AURA_LOG_LEVEL", "trace");
        std::env::set_var("AURA_MODEL", "gemini-test");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.logging.log_level, "trace");
        assert_eq!(config.insight.model, "gemini-test");

        std::env::remove_var("AURA_DB");
        std::env::remove_var("AURA_LOG_LEVEL");
        std::env::remove_var("AURA_MODEL");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/lib/aura.db"), PathBuf::from("/var/lib/aura.db"));
    }
}
