//! Concrete wizards built on [`StepFlow`](super::wizard::StepFlow).

pub mod booking;
pub mod password_reset;
pub mod signup;
pub mod tour_creation;

pub use booking::{BookingFlow, BookingStep};
pub use password_reset::{PasswordResetFlow, PasswordResetStep};
pub use signup::{SignupFlow, SignupStep};
pub use tour_creation::{TourCreationFlow, TourCreationStep};

use super::session_store::MIN_PASSWORD_LENGTH;
use crate::domain::foundation::{EmailAddress, ValidationError};
use crate::domain::wizard::FormFields;

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";
pub const CONFIRMATION_FIELD: &str = "password_confirmation";

const REJECTED_CODE: &str = "Invalid or expired code. Please try again.";

fn messages(errors: Vec<ValidationError>) -> Vec<String> {
    errors.iter().map(ValidationError::user_message).collect()
}

fn check_email(fields: &FormFields) -> Vec<String> {
    match EmailAddress::parse(fields.get(EMAIL_FIELD)) {
        Ok(_) => Vec::new(),
        Err(err) => vec![err.user_message()],
    }
}

fn check_code(fields: &FormFields, length: usize) -> Vec<String> {
    let code = fields.trimmed(super::otp_prompt::CODE_FIELD);
    if code.len() == length && code.chars().all(|c| c.is_ascii_digit()) {
        Vec::new()
    } else {
        vec![format!("Enter the {}-digit code", length)]
    }
}

fn check_new_password(fields: &FormFields) -> Vec<String> {
    let mut errors = Vec::new();
    let password = fields.get(PASSWORD_FIELD);
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    if password != fields.get(CONFIRMATION_FIELD) {
        errors.push("Passwords do not match".to_string());
    }
    errors
}

fn clear_password(fields: &mut FormFields) {
    fields.clear(PASSWORD_FIELD);
    fields.clear(CONFIRMATION_FIELD);
}
