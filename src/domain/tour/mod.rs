//! Tour listing module.

mod draft;
mod record;

pub use draft::TourDraft;
pub use record::{Tour, TourStatus};
