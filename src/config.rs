// Application configuration: optional TOML file plus environment overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sales::insights::DashboardLimits;
use crate::sales::types::SalesError;

pub const DEFAULT_CONFIG_FILE: &str = "vgsales.toml";
pub const ENV_DATA_PATH: &str = "VGSALES_DATA_PATH";
pub const ENV_CACHE_CAPACITY: &str = "VGSALES_CACHE_CAPACITY";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Sales file to load
    pub data_path: PathBuf,
    /// Number of processed tables kept in the dataset cache
    pub cache_capacity: usize,
    pub dashboard: DashboardLimits,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("vgsales.csv")
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_path: default_data_path(),
            cache_capacity: 4,
            dashboard: DashboardLimits::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, or from `vgsales.toml` in the working
    /// directory if present, then applies environment overrides.
    ///
    /// An explicit `path` that does not exist is an error; a missing default
    /// file just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SalesError> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => AppConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SalesError> {
        let content = std::fs::read_to_string(path).map_err(|e| SalesError::Config {
            message: format!("Failed to read config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SalesError> {
        toml::from_str::<AppConfig>(content).map_err(|e| SalesError::Config {
            message: format!("Invalid TOML: {}", e),
        })
    }

    /// Applies overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SalesError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATA_PATH).filter(|p| !p.trim().is_empty()) {
            self.data_path = PathBuf::from(path.trim());
        }

        if let Some(capacity) = lookup(ENV_CACHE_CAPACITY) {
            self.cache_capacity = capacity
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| SalesError::Config {
                    message: format!(
                        "{} must be a positive integer, got '{}'",
                        ENV_CACHE_CAPACITY, capacity
                    ),
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_path, PathBuf::from("vgsales.csv"));
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.dashboard.leaderboard, 20);
        assert_eq!(config.dashboard.filter_publishers, 20);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            data_path = "data/sales.csv"

            [dashboard]
            top_games = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("data/sales.csv"));
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.dashboard.top_games, 5);
        assert_eq!(config.dashboard.top_platforms, 15);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = AppConfig::from_toml_str("cache_capacity = \"lots\"");
        assert!(matches!(result, Err(SalesError::Config { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                (ENV_DATA_PATH, " /srv/vgsales.csv "),
                (ENV_CACHE_CAPACITY, "8"),
            ]))
            .unwrap();

        assert_eq!(config.data_path, PathBuf::from("/srv/vgsales.csv"));
        assert_eq!(config.cache_capacity, 8);
    }

    #[test]
    fn test_invalid_capacity_override_is_rejected() {
        let mut config = AppConfig::default();

        let result = config.apply_overrides(env(&[(ENV_CACHE_CAPACITY, "0")]));
        assert!(matches!(result, Err(SalesError::Config { .. })));

        let result = config.apply_overrides(env(&[(ENV_CACHE_CAPACITY, "many")]));
        assert!(matches!(result, Err(SalesError::Config { .. })));
        assert_eq!(config.cache_capacity, 4);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_capacity = 2").unwrap();
        file.flush().unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache_capacity, 2);
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let result = AppConfig::from_file(Path::new("/nonexistent/vgsales.toml"));
        assert!(matches!(result, Err(SalesError::Config { .. })));
    }
}
