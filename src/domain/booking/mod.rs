//! Booking module.
//!
//! The draft a traveler assembles across the checkout wizard, the reference
//! shown on the confirmation screen, and the stored booking record.

mod draft;
mod record;
mod reference;
mod summary;

pub use draft::{validate_options, BookingDraft, GuestDetails, PaymentMethod, MAX_CHILD_AGE};
pub use record::{Booking, BookingStatus};
pub use reference::BookingReference;
pub use summary::TourSummary;
