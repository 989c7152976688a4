//! # Configuration
//!
//! Shadowtext reads a small TOML file naming where stories and saved games
//! live and how to log. Every field has a default, so a missing section is
//! fine; `shadowtext init` writes the defaults out for editing.
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! stories_dir = "./data/stories"
//! saves_dir = "./data/saves"
//! # Saved game resumed by `shadowtext play` when --instance is not given
//! # autoload = "my-save"
//!
//! [logging]
//! level = "info"
//! file = "shadowtext.log"
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shadowtext::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("Stories: {}", config.game.stories_dir);
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::validation::validate_instance_name;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_stories_dir")]
    pub stories_dir: String,
    #[serde(default = "default_saves_dir")]
    pub saves_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload: Option<String>,
}

fn default_stories_dir() -> String {
    "./data/stories".to_string()
}

fn default_saves_dir() -> String {
    "./data/saves".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            stories_dir: default_stories_dir(),
            saves_dir: default_saves_dir(),
            autoload: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("shadowtext.log".to_string()),
        }
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject settings that would only fail later, mid-game.
    pub fn validate(&self) -> Result<()> {
        if self.game.stories_dir.trim().is_empty() {
            return Err(anyhow!("game.stories_dir must not be empty"));
        }
        if self.game.saves_dir.trim().is_empty() {
            return Err(anyhow!("game.saves_dir must not be empty"));
        }
        if let Some(name) = &self.game.autoload {
            validate_instance_name(name)
                .map_err(|e| anyhow!("game.autoload '{}' is not a valid instance name: {}", name, e))?;
        }
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
        Ok(())
    }
}
