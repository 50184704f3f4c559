//! Configuration validator for Memory-Probe
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, MemoryConfig, ScannerConfig};

/// Log levels accepted in `[logging] level`
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_memory(&config.memory)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.region_read_ceiling == 0 {
            return Err(ConfigError::Invalid(
                "Region read ceiling must be greater than 0".to_string(),
            ));
        }

        if scanner.region_read_ceiling > 104857600 {
            tracing::warn!(
                ceiling = scanner.region_read_ceiling,
                "region read ceiling exceeds 100MB"
            );
        }

        Ok(())
    }

    fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
        if memory.max_read_size == 0 {
            return Err(ConfigError::Invalid(
                "Maximum read size must be greater than 0".to_string(),
            ));
        }

        if memory.array_read_limit == 0 {
            return Err(ConfigError::Invalid(
                "Array read limit must be greater than 0".to_string(),
            ));
        }

        if memory.array_read_limit > memory.max_read_size {
            return Err(ConfigError::Invalid(format!(
                "Array read limit ({}) cannot exceed maximum read size ({})",
                memory.array_read_limit, memory.max_read_size
            )));
        }

        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
