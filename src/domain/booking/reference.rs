//! Human-facing booking reference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::foundation::ValidationError;

const PREFIX: &str = "BT";
const SUFFIX_LEN: usize = 10;

/// Reference shown to the traveler: `BT` followed by uppercase letters and
/// digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingReference(String);

impl BookingReference {
    /// Generates a fresh reference.
    pub fn generate() -> Self {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(SUFFIX_LEN)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(format!("{PREFIX}{suffix}"))
    }

    /// Parses an existing reference.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let suffix = trimmed.strip_prefix(PREFIX).ok_or_else(|| {
            ValidationError::invalid_format("booking_reference", "Reference must start with BT")
        })?;
        if suffix.is_empty()
            || !suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        {
            return Err(ValidationError::invalid_format(
                "booking_reference",
                "Reference must be BT followed by letters and digits",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BookingReference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BookingReference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookingReference> for String {
    fn from(value: BookingReference) -> Self {
        value.0
    }
}
