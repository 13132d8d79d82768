//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TOURBOOK` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use tourbook::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Backend at {}", config.collaborator.url);
//! ```

mod collaborator;
mod error;
mod otp;
mod pricing;
mod telemetry;
mod uploads;

pub use collaborator::CollaboratorConfig;
pub use error::{ConfigError, ValidationError};
pub use otp::OtpConfig;
pub use pricing::PricingConfig;
pub use telemetry::TelemetryConfig;
pub use uploads::UploadsConfig;

use serde::Deserialize;

/// Application environment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Hosted backend connection (URL, anon key, bucket)
    pub collaborator: CollaboratorConfig,

    /// One-time code settings
    #[serde(default)]
    pub otp: OtpConfig,

    /// Media upload limits
    #[serde(default)]
    pub uploads: UploadsConfig,

    /// Checkout fee and tax rates
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TOURBOOK` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TOURBOOK__COLLABORATOR__URL=...` -> `collaborator.url = ...`
    /// - `TOURBOOK__OTP__RESEND_COOLDOWN_SECS=30` -> `otp.resend_cooldown_secs = 30`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TOURBOOK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.collaborator.validate(&self.environment)?;
        self.otp.validate()?;
        self.uploads.validate()?;
        self.pricing.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
