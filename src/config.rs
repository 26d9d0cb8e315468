use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Where the question and history blobs live. Empty means the
    /// platform data directory.
    #[serde(default)]
    pub data_dir: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    /// chrono format string for history timestamps.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    #[serde(default)]
    pub preserve_import_ids: bool,
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_export_dir() -> String {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .to_string_lossy()
        .to_string()
}
fn default_timestamp_format() -> String {
    "%Y/%-m/%-d %H:%M:%S".to_string()
}
fn default_notice_secs() -> u64 {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            data_dir: String::new(),
            export_dir: default_export_dir(),
            timestamp_format: default_timestamp_format(),
            preserve_import_ids: false,
            notice_secs: default_notice_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizr")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        if self.data_dir.trim().is_empty() {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("quizr")
        } else {
            expand_home(&self.data_dir)
        }
    }

    pub fn export_path(&self) -> PathBuf {
        expand_home(&self.export_dir)
    }

    /// Repair values that would break the UI. Call after deserialization.
    pub fn validate(&mut self, valid_themes: &[String]) {
        if self.timestamp_format.trim().is_empty() {
            self.timestamp_format = default_timestamp_format();
        }
        if self.notice_secs == 0 {
            self.notice_secs = default_notice_secs();
        }
        if self.export_dir.trim().is_empty() {
            self.export_dir = default_export_dir();
        }
        if !valid_themes.is_empty() && !valid_themes.contains(&self.theme) {
            self.theme = default_theme();
        }
    }
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    PathBuf::from(path)
}
