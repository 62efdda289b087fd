//! Persistent settings for report runs.
//!
//! Stored as pretty JSON in `<config dir>/bodsight/config.json`. A missing or
//! unreadable file yields the defaults, so a fresh install needs no setup.

use crate::codelist::{DEFAULT_CODELIST_BASE_URL, DEFAULT_STANDARD_VERSION};
use crate::error::{BodsError, Result};
use crate::queries::QueryOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STANDARD_VERSION_ENV: &str = "BODSIGHT_STANDARD_VERSION";
pub const CODELIST_URL_ENV: &str = "BODSIGHT_CODELIST_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the data standard repository the codelists are read from
    pub codelist_base_url: String,
    /// Data standard release whose codelists are used (e.g. "0.2.0")
    pub standard_version: String,
    /// Where fetched codelists are kept; `None` disables caching
    pub codelist_cache_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    /// Reference line drawn on the share histograms, in percent
    pub share_threshold: f64,
    /// How many jurisdictions the jurisdiction chart shows
    pub top_jurisdictions: usize,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            codelist_base_url: DEFAULT_CODELIST_BASE_URL.to_owned(),
            standard_version: DEFAULT_STANDARD_VERSION.to_owned(),
            codelist_cache_dir: dirs::cache_dir().map(|d| d.join("bodsight").join("codelists")),
            request_timeout_secs: 30,
            share_threshold: 25.0,
            top_jurisdictions: 10,
            output_dir: PathBuf::from("reports"),
        }
    }
}

impl AppConfig {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            share_threshold: self.share_threshold,
            top_jurisdictions: self.top_jurisdictions,
        }
    }

    /// Applies `BODSIGHT_STANDARD_VERSION` and `BODSIGHT_CODELIST_URL` as
    /// returned by `get`. Blank values are ignored.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(version) = get(STANDARD_VERSION_ENV)
            && !version.trim().is_empty()
        {
            self.standard_version = version.trim().to_owned();
        }
        if let Some(url) = get(CODELIST_URL_ENV)
            && !url.trim().is_empty()
        {
            self.codelist_base_url = url.trim().trim_end_matches('/').to_owned();
        }
    }

    /// Rejects settings the queries cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`BodsError::Config`] naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if !self.share_threshold.is_finite() {
            return Err(BodsError::Config(
                "share_threshold must be a finite number".to_owned(),
            ));
        }
        if self.top_jurisdictions == 0 {
            return Err(BodsError::Config(
                "top_jurisdictions must be at least 1".to_owned(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(BodsError::Config(
                "request_timeout_secs must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bodsight")
        .join("config.json")
}

/// The stored configuration with environment overrides applied.
pub fn load_app_config() -> AppConfig {
    let mut config = read_config(&get_config_path());
    config.apply_overrides(|key| std::env::var(key).ok());
    config
}

/// Reads the configuration at `path`, or the defaults if it is absent or invalid.
pub fn read_config(path: &Path) -> AppConfig {
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
        && let Ok(config) = serde_json::from_str::<AppConfig>(&content)
    {
        config
    } else {
        AppConfig::default()
    }
}

/// Writes the configuration to the standard location; returns the path.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_app_config(config: &AppConfig) -> Result<PathBuf> {
    let path = get_config_path();
    write_config(config, &path)?;
    Ok(path)
}

/// Writes the configuration as pretty JSON, creating the directory if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!("Saved configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.standard_version, "0.2.0");
        assert_eq!(config.query_options().top_jurisdictions, 10);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"share_threshold": 10.0}"#).expect("parse partial config");
        assert!((config.share_threshold - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.top_jurisdictions, 10);
        assert_eq!(config.codelist_base_url, DEFAULT_CODELIST_BASE_URL);
    }

    #[test]
    fn test_validate_rejects_zero_top() {
        let config = AppConfig {
            top_jurisdictions: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(BodsError::Config(_))));
    }

    #[test]
    fn test_overrides_trim_and_skip_blank() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            STANDARD_VERSION_ENV => Some("  0.3.0 ".to_owned()),
            CODELIST_URL_ENV => Some("https://example.org/standard/".to_owned()),
            _ => None,
        });
        assert_eq!(config.standard_version, "0.3.0");
        assert_eq!(config.codelist_base_url, "https://example.org/standard");

        let mut config = AppConfig::default();
        config.apply_overrides(|_| Some("   ".to_owned()));
        assert_eq!(config, AppConfig::default());

        config.apply_overrides(|_| None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_write_then_read_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            share_threshold: 10.0,
            top_jurisdictions: 5,
            codelist_cache_dir: None,
            ..AppConfig::default()
        };
        write_config(&config, &path)?;
        assert_eq!(read_config(&path), config);
        Ok(())
    }

    #[test]
    fn test_read_config_invalid_file_gives_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json")?;
        assert_eq!(read_config(&path), AppConfig::default());
        assert_eq!(read_config(&dir.path().join("absent.json")), AppConfig::default());
        Ok(())
    }
}
