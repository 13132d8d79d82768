//! Booking draft accumulated across the checkout steps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{EmailAddress, ValidationError};

/// Oldest age that still counts as a child.
pub const MAX_CHILD_AGE: u8 = 17;

/// Payment method picked on the payment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Paypal,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "" => Err(ValidationError::invalid_format(
                "payment_method",
                "Select a payment method",
            )),
            other => Err(ValidationError::invalid_format(
                "payment_method",
                format!("Unsupported payment method '{}'", other),
            )),
        }
    }
}

/// Lead traveler contact details.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuestDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: Option<String>,
}

impl GuestDetails {
    /// Required-field and email-shape checks, in form order.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push(ValidationError::empty_field("first_name"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(ValidationError::empty_field("last_name"));
        }
        if let Err(err) = EmailAddress::parse(&self.email) {
            errors.push(err);
        }
        if self.phone.trim().is_empty() {
            errors.push(ValidationError::empty_field("phone"));
        }
        errors
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Checks the options step: date, party size, and child ages.
///
/// `travel_date` must be strictly after `today`. Children are part of the
/// traveler count, and at least one traveler must be an adult.
pub fn validate_options(
    travel_date: Option<NaiveDate>,
    today: NaiveDate,
    traveler_count: u32,
    max_group_size: u32,
    child_ages: &[u8],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match travel_date {
        None => errors.push(ValidationError::empty_field("travel_date")),
        Some(date) if date <= today => errors.push(ValidationError::invalid_format(
            "travel_date",
            "Travel date must be in the future",
        )),
        Some(_) => {}
    }

    let max = max_group_size.max(1);
    if traveler_count < 1 || traveler_count > max {
        errors.push(ValidationError::out_of_range(
            "traveler_count",
            1,
            i64::from(max),
            i64::from(traveler_count),
        ));
    }

    if let Some(age) = child_ages.iter().find(|age| **age > MAX_CHILD_AGE) {
        errors.push(ValidationError::out_of_range(
            "child_age",
            0,
            i64::from(MAX_CHILD_AGE),
            i64::from(*age),
        ));
    }

    if !child_ages.is_empty() && child_ages.len() as u64 >= u64::from(traveler_count) {
        errors.push(ValidationError::invalid_format(
            "child_ages",
            "At least one traveler must be an adult",
        ));
    }

    errors
}

/// Everything the traveler entered before payment.
///
/// Submitted as one unit from the payment step and then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub travel_date: NaiveDate,
    pub traveler_count: u32,
    pub child_ages: Vec<u8>,
    pub guest: GuestDetails,
    pub special_requests: Option<String>,
    pub payment_method: PaymentMethod,
}

impl BookingDraft {
    /// Re-runs every step's checks against the assembled draft.
    pub fn validate(&self, today: NaiveDate, max_group_size: u32) -> Vec<ValidationError> {
        let mut errors = validate_options(
            Some(self.travel_date),
            today,
            self.traveler_count,
            max_group_size,
            &self.child_ages,
        );
        errors.extend(self.guest.validate());
        errors
    }
}
