//! Upload limit configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::media::UploadLimits;

/// Maximum media sizes accepted for staging
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadsConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,

    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
}

impl UploadsConfig {
    pub fn limits(&self) -> UploadLimits {
        UploadLimits {
            max_image_bytes: self.max_image_bytes,
            max_video_bytes: self.max_video_bytes,
        }
    }

    /// Validate upload limits
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_image_bytes == 0 || self.max_video_bytes == 0 {
            return Err(ValidationError::InvalidUploadLimit);
        }
        Ok(())
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            max_video_bytes: default_max_video_bytes(),
        }
    }
}

fn default_max_image_bytes() -> u64 {
    UploadLimits::default().max_image_bytes
}

fn default_max_video_bytes() -> u64 {
    UploadLimits::default().max_video_bytes
}
