//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the lottery client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration settings for the lottery client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Transport configuration
    pub network: NetworkSettings,
    /// Remote site base URLs
    pub endpoints: EndpointSettings,
    /// Purchase workflow configuration
    pub purchase: PurchaseSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds
    pub read_timeout_secs: u64,
    /// Politeness delay applied before every request, in milliseconds
    pub request_delay_ms: u64,
    /// Maximum automatic retries for idempotent GET requests
    pub max_retries: u32,
}

/// Base URLs of the remote site
///
/// The main host serves login and my-page endpoints; the game host serves
/// the purchase form and its JSON endpoints. Both are overridable so tests
/// can point the client at a mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Main site base URL
    pub main_url: String,
    /// Online game site base URL
    pub game_url: String,
}

/// Purchase workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseSettings {
    /// Maximum submit attempts per purchase (malformed responses and
    /// network failures both count against this budget)
    pub max_attempts: u32,
    /// Backoff cap between submit attempts, in milliseconds
    pub backoff_cap_ms: u64,
    /// Round number of the anchor draw used when page scraping fails
    pub anchor_round: u32,
    /// Draw date of the anchor round
    pub anchor_draw_date: NaiveDate,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: NetworkSettings {
                connect_timeout_secs: 20,
                read_timeout_secs: 20,
                request_delay_ms: 200,
                max_retries: 3,
            },
            endpoints: EndpointSettings {
                main_url: "https://www.dhlottery.co.kr".to_string(),
                game_url: "https://ol.dhlottery.co.kr".to_string(),
            },
            purchase: PurchaseSettings {
                max_attempts: 5,
                backoff_cap_ms: 2000,
                // First Lotto 6/45 draw; one draw per week ever since.
                anchor_round: 1,
                anchor_draw_date: NaiveDate::from_ymd_opt(2002, 12, 7)
                    .expect("valid anchor date"),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                verbose: false,
            },
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load settings from environment variables on top of the defaults
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Apply environment variable overrides to these settings
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(secs) = std::env::var("CONNECT_TIMEOUT") {
            self.network.connect_timeout_secs = secs
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid CONNECT_TIMEOUT: {}", e)))?;
        }

        if let Ok(secs) = std::env::var("READ_TIMEOUT") {
            self.network.read_timeout_secs = secs
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid READ_TIMEOUT: {}", e)))?;
        }

        if let Ok(ms) = std::env::var("REQUEST_DELAY_MS") {
            self.network.request_delay_ms = ms
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid REQUEST_DELAY_MS: {}", e)))?;
        }

        if let Ok(retries) = std::env::var("MAX_RETRIES") {
            self.network.max_retries = retries
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid MAX_RETRIES: {}", e)))?;
        }

        if let Ok(url) = std::env::var("DHL_MAIN_URL") {
            self.endpoints.main_url = url;
        }

        if let Ok(url) = std::env::var("DHL_GAME_URL") {
            self.endpoints.game_url = url;
        }

        if let Ok(round) = std::env::var("DHL_ANCHOR_ROUND") {
            self.purchase.anchor_round = round
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid DHL_ANCHOR_ROUND: {}", e)))?;
        }

        if let Ok(date) = std::env::var("DHL_ANCHOR_DRAW_DATE") {
            self.purchase.anchor_draw_date = date.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid DHL_ANCHOR_DRAW_DATE: {}", e))
            })?;
        }

        Ok(self)
    }

    /// Validate the final configuration
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("main_url", &self.endpoints.main_url),
            ("game_url", &self.endpoints.game_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| crate::Error::Config(format!("Invalid {}: {}", name, e)))?;
        }

        if self.purchase.max_attempts == 0 {
            return Err(crate::Error::Config(
                "purchase.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.network.connect_timeout_secs == 0 || self.network.read_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "network timeouts must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.network.connect_timeout_secs, 20);
        assert_eq!(settings.network.request_delay_ms, 200);
        assert_eq!(settings.network.max_retries, 3);
        assert_eq!(settings.endpoints.main_url, "https://www.dhlottery.co.kr");
        assert_eq!(settings.purchase.max_attempts, 5);
        assert_eq!(settings.purchase.anchor_round, 1);
    }

    #[test]
    fn test_settings_validate() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());

        let mut broken = Settings::new();
        broken.endpoints.game_url = "not a url".to_string();
        assert!(broken.validate().is_err());

        let mut zero_attempts = Settings::new();
        zero_attempts.purchase.max_attempts = 0;
        assert!(zero_attempts.validate().is_err());
    }
}
