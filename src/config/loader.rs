//! Configuration loader for Memory-Probe
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::memory::scanner::ScanOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "MEMORY_PROBE_CONFIG";

/// Configuration file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "memory-probe.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_memory")]
    pub memory: MemoryConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Bytes read from any single region during a scan
    #[serde(default = "default_region_read_ceiling")]
    pub region_read_ceiling: usize,
    /// Regions visited per scan at most, 0 for no limit
    #[serde(default = "default_max_regions")]
    pub max_regions: usize,
    /// Query failures in a row that end a scan early, 0 for no limit
    #[serde(default = "default_query_failure_limit")]
    pub query_failure_limit: usize,
}

/// Memory configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_array_read_limit")]
    pub array_read_limit: usize,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl ScannerConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            region_read_ceiling: self.region_read_ceiling,
            max_regions: (self.max_regions > 0).then_some(self.max_regions),
            query_failure_limit: self.query_failure_limit,
            ..ScanOptions::default()
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loader for `$MEMORY_PROBE_CONFIG`, or `memory-probe.toml` when unset
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::new(path),
            None => Self::new(DEFAULT_CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is
    /// missing. A file that exists but does not parse is still an error.
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the environment-selected location
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::from_env().load_or_default()
}

// Default functions for serde
fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        region_read_ceiling: defaults.scanner.region_read_ceiling,
        max_regions: defaults.scanner.max_regions,
        query_failure_limit: defaults.scanner.query_failure_limit,
    }
}

fn default_memory() -> MemoryConfig {
    let defaults = default_config();
    MemoryConfig {
        array_read_limit: defaults.memory.array_read_limit,
        max_read_size: defaults.memory.max_read_size,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_config().logging.level,
    }
}

// Individual field defaults
fn default_region_read_ceiling() -> usize {
    default_config().scanner.region_read_ceiling
}

fn default_max_regions() -> usize {
    default_config().scanner.max_regions
}

fn default_query_failure_limit() -> usize {
    default_config().scanner.query_failure_limit
}

fn default_array_read_limit() -> usize {
    default_config().memory.array_read_limit
}

fn default_max_read_size() -> usize {
    default_config().memory.max_read_size
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scanner: default_scanner(),
            memory: default_memory(),
            logging: default_logging(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scanner.region_read_ceiling, 104857600);
        assert_eq!(config.memory.array_read_limit, 1024);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let result = loader.load();
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_or_default() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let config = loader.load_or_default().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[scanner\nregion_read_ceiling = ").unwrap();

        let result = ConfigLoader::new(&path).load_or_default();
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.scanner.max_regions = 500;
        let loader = ConfigLoader::new(&config_path);

        loader.save(&config).unwrap();
        assert!(config_path.exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [scanner]
            max_regions = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scanner.max_regions, 10);
        // Check defaults are applied
        assert_eq!(config.scanner.region_read_ceiling, 104857600);
        assert_eq!(config.memory.array_read_limit, 1024);
    }

    #[test]
    fn test_scan_options_from_config() {
        let mut scanner = Config::default().scanner;
        assert_eq!(scanner.scan_options().max_regions, None);
        assert_eq!(scanner.scan_options(), ScanOptions::default());

        scanner.max_regions = 3;
        scanner.region_read_ceiling = 4096;
        scanner.query_failure_limit = 0;
        let options = scanner.scan_options();
        assert_eq!(options.max_regions, Some(3));
        assert_eq!(options.region_read_ceiling, 4096);
        assert_eq!(options.query_failure_limit, 0);
    }
}
