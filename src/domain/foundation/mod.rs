//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, authentication types, and error
//! types that form the vocabulary of the booking domain.

mod auth;
mod email;
mod errors;
mod ids;
mod percentage;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, Identity, PendingVerification, Role};
pub use email::EmailAddress;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{BookingId, TourId, UserId};
pub use percentage::Percentage;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
