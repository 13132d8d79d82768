//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, auth types, errors)
//! - `wizard` - Step contract, form fields, action status, wizard state
//! - `otp` - One-time code input, resend countdown, attempt cap
//! - `pricing` - Derived booking prices and discounts
//! - `booking` - Booking draft, reference, and stored record
//! - `tour` - Tour listing record and draft validation
//! - `media` - Upload staging checks

pub mod booking;
pub mod foundation;
pub mod media;
pub mod otp;
pub mod pricing;
pub mod tour;
pub mod wizard;
