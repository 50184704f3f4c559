//! Configuration module for Memory-Probe
//!
//! Provides configuration loading, validation, and default settings.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{
    load_config, ConfigLoader, LoggingConfig, MemoryConfig, ScannerConfig, CONFIG_PATH_ENV,
    DEFAULT_CONFIG_FILE,
};
pub use validator::{validate_config, ConfigValidator, LOG_LEVELS};

// Re-export the main configuration structure
pub use loader::Config;

// Configuration-related error type
pub use loader::ConfigError;

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_from_io() {
        use std::io;
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let config_error: ConfigError = io_error.into();
        assert!(matches!(config_error, ConfigError::Io(_)));
    }

    #[test]
    fn test_defaults_validate() {
        let result: ConfigResult<()> = validate_config(&Config::default());
        assert!(result.is_ok());
    }
}
