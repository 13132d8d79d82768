//! Tour data handed to the checkout wizard on navigation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Percentage, TourId};
use crate::domain::pricing::{discount_percentage, Amount};

/// The slice of a tour the booking flow needs.
///
/// The checkout wizard cannot be mounted without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourSummary {
    pub id: TourId,
    pub title: String,
    pub location: String,
    pub price: Amount,
    pub original_price: Option<Amount>,
    pub max_group_size: u32,
    pub duration_days: u32,
    pub image_url: Option<String>,
}

impl TourSummary {
    /// Displayed discount against the original price, zero if none.
    pub fn discount(&self) -> Percentage {
        self.original_price
            .map(|original| discount_percentage(original, self.price))
            .unwrap_or(Percentage::ZERO)
    }

    /// Route the booking flow lives at, used as the post-sign-in redirect.
    pub fn booking_path(&self) -> String {
        format!("/tours/{}/book", self.id)
    }
}
