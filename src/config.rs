use serde::Deserialize;
use std::path::Path;

use crate::cron_utils::parse_schedule;

/// Environment variable consulted when `telegram.bot_token` is empty.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Telegram user IDs allowed to use the bot. Empty admits everyone.
    #[serde(default)]
    pub allowed_user_ids: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemindersConfig {
    /// When daily reminders fire, in the system timezone.
    /// `daily at 9am`, `09:00`, `daily` or a 5-field cron expression.
    #[serde(default = "default_reminder_schedule")]
    pub schedule: String,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            schedule: default_reminder_schedule(),
        }
    }
}

impl RemindersConfig {
    /// The schedule as a cron expression.
    pub fn cron_expr(&self) -> anyhow::Result<String> {
        parse_schedule(&self.schedule)
    }
}

fn default_reminder_schedule() -> String {
    "daily at 9am".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DaemonConfig {
    /// Port for the `/health` endpoint. 0 disables the server.
    #[serde(default = "default_health_port")]
    pub health_port: u16,
    /// IP address to bind the health server to (default: "127.0.0.1").
    /// Set to "0.0.0.0" to listen on all interfaces.
    #[serde(default = "default_health_bind")]
    pub health_bind: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            health_port: default_health_port(),
            health_bind: default_health_bind(),
        }
    }
}

fn default_health_port() -> u16 {
    8080
}

fn default_health_bind() -> String {
    "127.0.0.1".to_string()
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&content, std::env::var(BOT_TOKEN_ENV).ok())
    }

    /// Parse and validate. `env_token` fills in an empty `bot_token`.
    pub fn from_toml(content: &str, env_token: Option<String>) -> anyhow::Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        if config.telegram.bot_token.trim().is_empty() {
            config.telegram.bot_token = env_token.unwrap_or_default();
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!(
                "No Telegram bot token: set telegram.bot_token in config.toml or {}",
                BOT_TOKEN_ENV
            );
        }
        self.reminders
            .cron_expr()
            .map_err(|e| anyhow::anyhow!("Invalid reminders.schedule: {}", e))?;
        Ok(())
    }
}
