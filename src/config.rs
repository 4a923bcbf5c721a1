//! Configuration for the acquisition pipeline.
//!
//! Settings come from an optional TOML file in the data directory, with
//! environment variables taking precedence. Everything has a default so a
//! bare `melk init` works out of the box.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Config file name inside the data directory.
const CONFIG_FILE: &str = "melkacquire.toml";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_page_timeout_secs() -> u64 {
    20
}

fn default_image_timeout_secs() -> u64 {
    10
}

fn default_ad_delay_ms() -> u64 {
    4000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_headless() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root for the database, images, and config file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database URL; defaults to `<data_dir>/melkacquire.db`.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Page navigation timeout for the browser fetcher.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Per-image download timeout.
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,

    /// Delay between listing pages when scraping.
    #[serde(default = "default_ad_delay_ms")]
    pub ad_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Run Chrome headless; turn off for debugging.
    #[serde(default = "default_headless")]
    pub chrome_headless: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_url: None,
            page_timeout_secs: default_page_timeout_secs(),
            image_timeout_secs: default_image_timeout_secs(),
            ad_delay_ms: default_ad_delay_ms(),
            user_agent: default_user_agent(),
            chrome_headless: default_headless(),
        }
    }
}

impl Settings {
    /// Load settings for a data directory: TOML file if present, then
    /// environment overrides.
    pub fn load(data_dir: &Path) -> anyhow::Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("invalid config in {}", path.display()))?
        } else {
            Settings::default()
        };

        settings.data_dir = data_dir.to_path_buf();
        settings.apply_env();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Some(url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
            self.database_url = Some(url);
        }
        if let Ok(v) = std::env::var("MELK_PAGE_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                self.page_timeout_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("MELK_HEADLESS") {
            self.chrome_headless = v != "0" && v != "false";
        }
    }

    /// Effective database URL.
    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| self.data_dir.join("melkacquire.db").display().to_string())
    }

    /// Directory that holds downloaded listing images.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Write the current settings to the config file in the data directory.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.data_dir.join(CONFIG_FILE);
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.page_timeout_secs, 20);
        assert_eq!(settings.image_timeout_secs, 10);
        assert!(settings.chrome_headless);
        assert!(settings
            .database_url()
            .ends_with("melkacquire.db"));
        assert_eq!(settings.images_dir(), dir.path().join("images"));
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::load(dir.path()).unwrap();
        settings.page_timeout_secs = 5;
        settings.save().unwrap();

        let reloaded = Settings::load(dir.path()).unwrap();
        assert_eq!(reloaded.page_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "page_timeout_secs = []").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }
}
