//! Hackbot configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HackError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HackbotConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub teams: TeamConfig,
    #[serde(default)]
    pub support: SupportConfig,
}

impl HackbotConfig {
    /// Load config from the default path (~/.hackbot/config.toml), then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HackError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HackError::Config(format!("Failed to parse config: {e}")))
    }

    /// Save config to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| HackError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment variables win over the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("BOT_TOKEN").filter(|v| !v.is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(path) = lookup("DATABASE_PATH").filter(|v| !v.is_empty()) {
            self.database.path = path;
        }
        if let Some(tz) = lookup("TIMEZONE").filter(|v| !v.is_empty()) {
            self.scheduler.timezone = tz;
        }
        if let Some(size) = lookup("MAX_TEAM_SIZE").and_then(|v| v.trim().parse().ok()) {
            self.teams.max_team_size = size;
        }
        if let Some(email) = lookup("SUPPORT_EMAIL").filter(|v| !v.is_empty()) {
            self.support.email = email;
        }
    }

    /// Reject settings the rest of the system cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.tz()?;
        let teams = &self.teams;
        if teams.code_alphabet.is_empty() {
            return Err(HackError::Config("teams.code_alphabet must not be empty".into()));
        }
        if teams.code_min_len == 0 || teams.code_min_len > teams.code_max_len {
            return Err(HackError::Config(format!(
                "invalid join code length range {}..={}",
                teams.code_min_len, teams.code_max_len
            )));
        }
        if teams.max_team_size == 0 {
            return Err(HackError::Config("teams.max_team_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Hackbot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hackbot")
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_poll_interval() -> u64 { 1 }
fn default_poll_timeout() -> u64 { 30 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "~/.hackbot/hackbot.db".into() }

impl DatabaseConfig {
    /// Database path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

/// Reminder scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// IANA timezone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Pause between two outbound messages of one fan-out.
    #[serde(default = "default_send_delay")]
    pub send_delay_ms: u64,
}

fn default_timezone() -> String { "Asia/Tashkent".into() }
fn default_check_interval() -> u64 { 3600 }
fn default_send_delay() -> u64 { 50 }

impl SchedulerConfig {
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| HackError::Config(format!("invalid timezone: {}", self.timezone)))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            check_interval_secs: default_check_interval(),
            send_delay_ms: default_send_delay(),
        }
    }
}

/// Team formation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    #[serde(default = "default_code_alphabet")]
    pub code_alphabet: String,
    #[serde(default = "default_code_len")]
    pub code_min_len: usize,
    #[serde(default = "default_code_len")]
    pub code_max_len: usize,
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
    #[serde(default = "default_max_team_size")]
    pub max_team_size: usize,
}

// No 0/O or 1/I: codes get typed by hand.
fn default_code_alphabet() -> String { "ABCDEFGHJKLMNPQRSTUVWXYZ23456789".into() }
fn default_code_len() -> usize { 6 }
fn default_max_code_attempts() -> u32 { 32 }
fn default_max_team_size() -> usize { 5 }

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            code_alphabet: default_code_alphabet(),
            code_min_len: default_code_len(),
            code_max_len: default_code_len(),
            max_code_attempts: default_max_code_attempts(),
            max_team_size: default_max_team_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    #[serde(default = "default_support_email")]
    pub email: String,
    #[serde(default)]
    pub faq_url: Option<String>,
}

fn default_support_email() -> String { "support@example.org".into() }

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            email: default_support_email(),
            faq_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = HackbotConfig::from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"

            [teams]
            max_team_size = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.teams.max_team_size, 4);
        assert_eq!(config.teams.code_min_len, 6);
        assert_eq!(config.scheduler.timezone, "Asia/Tashkent");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BOT_TOKEN", "42:xyz"),
            ("TIMEZONE", "Europe/Berlin"),
            ("MAX_TEAM_SIZE", "7"),
            ("SUPPORT_EMAIL", ""),
        ]
        .into_iter()
        .collect();
        let mut config = HackbotConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.telegram.bot_token, "42:xyz");
        assert_eq!(config.scheduler.timezone, "Europe/Berlin");
        assert_eq!(config.teams.max_team_size, 7);
        // Empty values do not clobber the file.
        assert_eq!(config.support.email, "support@example.org");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = HackbotConfig::default();
        config.scheduler.timezone = "Mars/Olympus".into();
        assert!(config.validate().is_err());

        let mut config = HackbotConfig::default();
        config.teams.code_min_len = 8;
        config.teams.code_max_len = 4;
        assert!(config.validate().is_err());

        let mut config = HackbotConfig::default();
        config.teams.code_alphabet.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join("hackbot-test-config");
        let path = dir.join("config.toml");
        let mut config = HackbotConfig::default();
        config.support.faq_url = Some("https://example.org/faq".into());
        config.save_to(&path).unwrap();
        let loaded = HackbotConfig::load_from(&path).unwrap();
        assert_eq!(loaded.support.faq_url.as_deref(), Some("https://example.org/faq"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
