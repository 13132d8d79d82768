//! Hosted backend configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::Environment;

/// Connection settings for the hosted backend
#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorConfig {
    /// Project base URL (e.g. `https://project.example.co`)
    pub url: String,

    /// Public anon key sent with every request
    pub anon_key: Secret<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Storage bucket for tour media
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
}

impl CollaboratorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate collaborator configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("collaborator.url"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(ValidationError::InvalidCollaboratorUrl);
        }
        if *environment != Environment::Development && !self.url.starts_with("https://") {
            return Err(ValidationError::CollaboratorMustBeHttps);
        }
        if self.anon_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("collaborator.anon_key"));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.storage_bucket.trim().is_empty() {
            return Err(ValidationError::MissingRequired("collaborator.storage_bucket"));
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    15
}

fn default_storage_bucket() -> String {
    "media".to_string()
}
