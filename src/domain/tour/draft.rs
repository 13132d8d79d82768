//! Listing details entered in the admin panel before media is attached.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;
use crate::domain::pricing::Amount;

/// Text, pricing and capacity fields of a new or edited tour.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TourDraft {
    pub title: String,
    pub location: String,
    pub description: String,
    pub duration_days: u32,
    pub price: Amount,
    pub original_price: Option<Amount>,
    pub max_group_size: u32,
}

impl TourDraft {
    /// Checks the basic-info fields.
    pub fn validate_basics(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(ValidationError::empty_field("title"));
        }
        if self.location.trim().is_empty() {
            errors.push(ValidationError::empty_field("location"));
        }
        if self.description.trim().is_empty() {
            errors.push(ValidationError::empty_field("description"));
        }
        if self.duration_days < 1 {
            errors.push(ValidationError::out_of_range(
                "duration_days",
                1,
                i64::from(u32::MAX),
                i64::from(self.duration_days),
            ));
        }
        errors
    }

    /// Checks price, original price and capacity.
    pub fn validate_pricing(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.price == Amount::ZERO {
            errors.push(ValidationError::invalid_format(
                "price",
                "Price must be greater than zero",
            ));
        }
        if let Some(original) = self.original_price {
            if original < self.price {
                errors.push(ValidationError::invalid_format(
                    "original_price",
                    "Original price cannot be lower than the price",
                ));
            }
        }
        if self.max_group_size < 1 {
            errors.push(ValidationError::invalid_format(
                "max_group_size",
                "Group size must be at least 1",
            ));
        }
        errors
    }

    /// All checks, basics first.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.validate_basics();
        errors.extend(self.validate_pricing());
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TourDraft {
        TourDraft {
            title: "Glacier Walk".to_string(),
            location: "Reykjavik".to_string(),
            description: "A day on the ice.".to_string(),
            duration_days: 1,
            price: Amount::new(25_000),
            original_price: Some(Amount::new(30_000)),
            max_group_size: 8,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_empty());
    }

    #[test]
    fn empty_draft_reports_every_basic_field() {
        let fields: Vec<String> = TourDraft::default()
            .validate_basics()
            .iter()
            .map(|e| e.field().to_string())
            .collect();
        assert_eq!(fields, vec!["title", "location", "description", "duration_days"]);
    }

    #[test]
    fn pricing_rejects_zero_price_and_low_original() {
        let mut d = draft();
        d.price = Amount::ZERO;
        assert_eq!(d.validate_pricing()[0].field(), "price");

        let mut d = draft();
        d.original_price = Some(Amount::new(100));
        assert_eq!(d.validate_pricing()[0].field(), "original_price");
    }

    #[test]
    fn pricing_requires_capacity() {
        let mut d = draft();
        d.max_group_size = 0;
        assert_eq!(d.validate_pricing().len(), 1);
    }
}
