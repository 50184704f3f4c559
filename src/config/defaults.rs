//! Default configuration values for Memory-Probe

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub memory: MemoryDefaults,
    pub logging: LoggingDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub region_read_ceiling: usize,
    pub max_regions: usize,
    pub query_failure_limit: usize,
}

/// Default memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDefaults {
    pub array_read_limit: usize,
    pub max_read_size: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            region_read_ceiling: 104857600, // 100MB
            max_regions: 0,                 // unlimited
            query_failure_limit: 256,
        },
        memory: MemoryDefaults {
            array_read_limit: 1024,
            max_read_size: 104857600, // 100MB
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}
