//! One-time code configuration

use serde::Deserialize;

use super::error::ValidationError;

/// One-time code input, resend and attempt settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OtpConfig {
    /// Digits per code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds before a code may be resent
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: u32,

    /// Incorrect submissions allowed per issued code
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
}

impl OtpConfig {
    /// Validate one-time code configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(4..=10).contains(&self.code_length) {
            return Err(ValidationError::InvalidCodeLength);
        }
        if self.resend_cooldown_secs == 0 || self.resend_cooldown_secs > 600 {
            return Err(ValidationError::InvalidResendCooldown);
        }
        if self.max_failed_attempts == 0 {
            return Err(ValidationError::InvalidAttemptCap);
        }
        Ok(())
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            resend_cooldown_secs: default_resend_cooldown(),
            max_failed_attempts: default_max_failed_attempts(),
        }
    }
}

fn default_code_length() -> usize {
    crate::domain::otp::CODE_LENGTH
}

fn default_resend_cooldown() -> u32 {
    crate::domain::otp::RESEND_COOLDOWN_TICKS
}

fn default_max_failed_attempts() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_defaults() {
        let config = OtpConfig::default();
        assert_eq!(config.code_length, 6);
        assert_eq!(config.resend_cooldown_secs, 60);
        assert_eq!(config.max_failed_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_otp_bounds() {
        let config = OtpConfig {
            code_length: 3,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCodeLength));

        let config = OtpConfig {
            max_failed_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidAttemptCap));
    }
}
