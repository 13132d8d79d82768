//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid collaborator URL format")]
    InvalidCollaboratorUrl,

    #[error("Collaborator URL must use HTTPS outside development")]
    CollaboratorMustBeHttps,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("One-time code length must be between 4 and 10")]
    InvalidCodeLength,

    #[error("Resend cooldown must be between 1 and 600 seconds")]
    InvalidResendCooldown,

    #[error("Failed-attempt cap must be at least 1")]
    InvalidAttemptCap,

    #[error("Upload limits must be non-zero")]
    InvalidUploadLimit,

    #[error("Service fee must be at most 100 percent")]
    InvalidServiceFee,

    #[error("Tax rate must be at most 10000 basis points")]
    InvalidTaxRate,
}
