//! Configuration loading utilities

use crate::Config;
use chrono::NaiveDate;
use footfall_common::FootfallError;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Files checked, in order, when `FOOTFALL_CONFIG_PATH` is not set.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["footfall.yaml", "footfall.yml", "footfall.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// File extension is neither YAML nor TOML
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParseError {
        /// Variable name
        var: String,
        /// Parser message
        message: String,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[source] FootfallError),
}

impl From<ConfigError> for FootfallError {
    fn from(err: ConfigError) -> Self {
        FootfallError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file with environment overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::parse_file(path)?;
        info!("Loaded configuration from {}", path.display());

        Self::apply_env_overrides(&mut config)?;
        config.validate().map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    /// Load configuration from `FOOTFALL_CONFIG_PATH`, a default file in the
    /// working directory, or defaults, in that order
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(config_path) = env::var("FOOTFALL_CONFIG_PATH") {
            return Self::load_config(config_path);
        }

        if let Some(path) = DEFAULT_CONFIG_FILES
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
        {
            return Self::load_config(path);
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Parse a configuration file, choosing the format by extension
    pub fn parse_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |var| env::var(var).ok())
    }

    /// Apply overrides read through `lookup`, which maps a variable name to
    /// its value
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup("FOOTFALL_API_KEY") {
            config.provider.api_key = Some(api_key);
        }

        if let Some(url) = lookup("FOOTFALL_API_URL") {
            config.provider.url = url;
        }

        if let Some(city) = lookup("FOOTFALL_CITY") {
            config.region.city = city;
        }

        if let Some(region) = lookup("FOOTFALL_REGION") {
            config.region.region = region;
        }

        if let Some(value) = lookup("FOOTFALL_START_DATE") {
            config.range.start_date = parse_var::<NaiveDate>("FOOTFALL_START_DATE", &value)?;
        }

        if let Some(value) = lookup("FOOTFALL_END_DATE") {
            config.range.end_date = Some(parse_var::<NaiveDate>("FOOTFALL_END_DATE", &value)?);
        }

        if let Some(value) = lookup("FOOTFALL_MAX_PAGES") {
            config.provider.max_pages = Some(parse_var("FOOTFALL_MAX_PAGES", &value)?);
        }

        if let Some(value) = lookup("FOOTFALL_MAX_RETRIES") {
            config.provider.max_retries = parse_var("FOOTFALL_MAX_RETRIES", &value)?;
        }

        if let Some(level) = lookup("FOOTFALL_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvParseError {
        var: var.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_yaml_with_partial_sections() {
        let file = write_temp(
            ".yaml",
            "region:\n  city: Idaho Falls\nrange:\n  start_date: 2023-03-01\n  anchor: Mon\n",
        );
        let config = ConfigLoader::parse_file(file.path()).unwrap();
        assert_eq!(config.region.city, "Idaho Falls");
        assert_eq!(config.region.region, "ID");
        assert_eq!(
            config.range.start_date,
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
        assert_eq!(config.range.anchor, chrono::Weekday::Mon);
        assert_eq!(config.provider.page_size, 500);
    }

    #[test]
    fn test_parse_toml() {
        let file = write_temp(
            ".toml",
            "[provider]\nmax_pages = 4\npage_size = 100\n\n[analysis]\nbrand_limit = 5\n",
        );
        let config = ConfigLoader::parse_file(file.path()).unwrap();
        assert_eq!(config.provider.max_pages, Some(4));
        assert_eq!(config.provider.page_size, 100);
        assert_eq!(config.analysis.brand_limit, 5);
    }

    #[test]
    fn test_parse_toml_dates() {
        let file = write_temp(
            ".toml",
            "[range]\nstart_date = 2023-03-01\nend_date = \"2023-04-30\"\nanchor = \"Sun\"\n",
        );
        let config = ConfigLoader::parse_file(file.path()).unwrap();
        assert_eq!(
            config.range.start_date,
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
        assert_eq!(config.range.end_date, NaiveDate::from_ymd_opt(2023, 4, 30));
    }

    #[test]
    fn test_toml_date_with_time_is_rejected() {
        let file = write_temp(".toml", "[range]\nstart_date = 2023-03-01T08:00:00\n");
        let err = ConfigLoader::parse_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".ini", "city=Rexburg");
        let err = ConfigLoader::parse_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let file = write_temp(".yml", "provider: [unclosed");
        let err = ConfigLoader::parse_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::YamlError(_)));
    }

    #[test]
    fn test_load_config_validates() {
        let file = write_temp(".yaml", "provider:\n  page_size: 9000\n");
        let err = ConfigLoader::load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("FOOTFALL_API_KEY", "key-123"),
            ("FOOTFALL_CITY", "Rigby"),
            ("FOOTFALL_START_DATE", "2022-06-05"),
            ("FOOTFALL_END_DATE", "2022-07-01"),
            ("FOOTFALL_MAX_PAGES", "3"),
            ("FOOTFALL_LOG_LEVEL", "debug"),
        ]);
        ConfigLoader::apply_overrides_from(&mut config, lookup).unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.region.city, "Rigby");
        assert_eq!(
            config.range.start_date,
            NaiveDate::from_ymd_opt(2022, 6, 5).unwrap()
        );
        assert_eq!(config.range.end_date, NaiveDate::from_ymd_opt(2022, 7, 1));
        assert_eq!(config.provider.max_pages, Some(3));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_override_parse_error_names_variable() {
        let mut config = Config::default();
        let err = ConfigLoader::apply_overrides_from(
            &mut config,
            lookup_from(&[("FOOTFALL_MAX_RETRIES", "many")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("FOOTFALL_MAX_RETRIES"));

        let err = ConfigLoader::apply_overrides_from(
            &mut config,
            lookup_from(&[("FOOTFALL_START_DATE", "01/01/2022")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { ref var, .. } if var == "FOOTFALL_START_DATE"));
    }

    #[test]
    fn test_config_error_converts_to_common_error() {
        let err: FootfallError = ConfigError::UnsupportedFormat(PathBuf::from("x.ini")).into();
        assert!(err.to_string().contains("Configuration error"));
    }
}
