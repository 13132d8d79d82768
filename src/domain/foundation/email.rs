//! Email address value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A trimmed, lowercased email address with a plausible shape.
///
/// Only the shape is checked (`local@domain.tld`); deliverability is the
/// auth service's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and normalizes an address.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        if !Self::has_valid_shape(&normalized) {
            return Err(ValidationError::invalid_format(
                "email",
                "Enter a valid email address",
            ));
        }
        Ok(Self(normalized))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn has_valid_shape(candidate: &str) -> bool {
        if candidate.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = candidate.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        match domain.rsplit_once('.') {
            Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
            None => false,
        }
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
