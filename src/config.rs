use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const PLACEHOLDER_API_KEY: &str = "your_grok_api_key_here";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grok_api_key: Option<String>,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub region_tables: RegionTables,
}

/// Destination table names, one per region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionTables {
    #[serde(default = "default_china_table")]
    pub china: String,
    #[serde(default = "default_global_table")]
    pub global: String,
    #[serde(default = "default_tech_table")]
    pub tech: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("grok-news-collector");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_api_endpoint() -> String {
    "https://api.x.ai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "grok-3-latest".to_string()
}

fn default_china_table() -> String {
    "china_news".to_string()
}

fn default_global_table() -> String {
    "global_news".to_string()
}

fn default_tech_table() -> String {
    "tech_news".to_string()
}

impl Default for RegionTables {
    fn default() -> Self {
        Self {
            china: default_china_table(),
            global: default_global_table(),
            tech: default_tech_table(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grok_api_key: None,
            db_path: default_db_path(),
            api_endpoint: default_api_endpoint(),
            model: default_model(),
            region_tables: RegionTables::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grok-news-collector")
            .join("config.toml")
    }

    /// Validate the credentials before any network call is attempted.
    /// A missing or placeholder API key and an empty database path both
    /// halt the run with a user-facing message.
    pub fn validate(&self, api_key: &Option<String>) -> Result<()> {
        match api_key {
            Some(key) if !key.trim().is_empty() && key != PLACEHOLDER_API_KEY => {}
            _ => {
                return Err(AppError::Config(format!(
                    "GROK_API_KEY is not configured. Set the GROK_API_KEY environment \
                     variable or add grok_api_key to {}",
                    Self::config_path().display()
                )))
            }
        }

        if self.db_path.trim().is_empty() {
            return Err(AppError::Config(
                "db_path is empty; set it in the config file to the destination database"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
