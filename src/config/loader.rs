//! Configuration loading utilities
//!
//! Provides helper functions for loading configuration from various sources
//! with proper error handling and validation.

use crate::{Result, config::Settings};
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration loader with multiple source support
#[derive(Debug)]
pub struct ConfigLoader {
    /// Default settings
    defaults: Settings,
}

impl ConfigLoader {
    /// Create new configuration loader
    pub fn new() -> Self {
        Self {
            defaults: Settings::default(),
        }
    }

    /// Load configuration with precedence order:
    /// 1. Environment variables (highest priority)
    /// 2. Configuration file
    /// 3. Default values (lowest priority)
    pub fn load(&self, config_file: Option<&Path>) -> Result<Settings> {
        let mut settings = self.defaults.clone();

        // Load from config file if provided
        if let Some(path) = config_file {
            if path.exists() {
                info!("Loading configuration from file: {:?}", path);
                settings = Settings::from_file(path)?;
            } else {
                warn!("Configuration file not found: {:?}, using defaults", path);
            }
        }

        // Override with environment variables
        debug!("Applying environment variable overrides");
        settings = settings.merge_with_env()?;

        // Validate final configuration
        settings.validate()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:?}", settings);

        Ok(settings)
    }

    /// Load configuration from environment only
    pub fn from_env_only(&self) -> Result<Settings> {
        let settings = Settings::from_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Get default configuration
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_defaults() {
        let loader = ConfigLoader::new();
        let settings = loader.defaults();

        assert_eq!(settings.network.max_retries, 3);
        assert_eq!(settings.purchase.max_attempts, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[network]
connect_timeout_secs = 5
read_timeout_secs = 30
request_delay_ms = 0
max_retries = 1

[endpoints]
main_url = "http://localhost:8080"
game_url = "http://localhost:8081"

[purchase]
max_attempts = 2
backoff_cap_ms = 100
anchor_round = 1
anchor_draw_date = "2002-12-07"

[logging]
level = "debug"
verbose = true
        "#
        )
        .unwrap();

        let loader = ConfigLoader::new();
        let settings = loader.load(Some(temp_file.path())).unwrap();

        assert_eq!(settings.network.connect_timeout_secs, 5);
        assert_eq!(settings.network.read_timeout_secs, 30);
        assert_eq!(settings.endpoints.main_url, "http://localhost:8080");
        assert_eq!(settings.purchase.max_attempts, 2);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_env_var_override() {
        unsafe {
            std::env::set_var("MAX_RETRIES", "7");
            std::env::set_var("REQUEST_DELAY_MS", "50");
        }

        let loader = ConfigLoader::new();
        let settings = loader.from_env_only().unwrap();

        assert_eq!(settings.network.max_retries, 7);
        assert_eq!(settings.network.request_delay_ms, 50);

        unsafe {
            std::env::remove_var("MAX_RETRIES");
            std::env::remove_var("REQUEST_DELAY_MS");
        }
    }
}
