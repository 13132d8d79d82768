//! BookingLedger - confirmed bookings.

use std::sync::Arc;

use tracing::info;

use super::{decode, decode_all, encode, record_error, validation_failure, BOOKINGS};
use crate::domain::booking::{Booking, BookingDraft, TourSummary};
use crate::domain::foundation::{
    BookingId, DomainError, ErrorCode, Identity, Role, UserId, ValidationError,
};
use crate::domain::pricing::PriceQuote;
use crate::ports::{RecordFilter, RecordStore, SortOrder};

/// Reads and writes the `bookings` collection.
pub struct BookingLedger {
    records: Arc<dyn RecordStore>,
}

impl BookingLedger {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Records a confirmed booking for `identity`.
    ///
    /// The draft's dates are checked by the wizard; here only the party
    /// size against the tour and the guest details are re-checked.
    pub async fn create(
        &self,
        draft: BookingDraft,
        tour: &TourSummary,
        identity: &Identity,
        quote: &PriceQuote,
    ) -> Result<Booking, DomainError> {
        let mut errors = draft.guest.validate();
        if draft.traveler_count == 0 || draft.traveler_count > tour.max_group_size {
            errors.push(ValidationError::out_of_range(
                "traveler_count",
                1,
                i64::from(tour.max_group_size),
                i64::from(draft.traveler_count),
            ));
        }
        if !errors.is_empty() {
            return Err(validation_failure(&errors));
        }

        let booking = Booking::confirm(draft, tour.id, identity.id.clone(), quote);
        let row = self
            .records
            .insert(BOOKINGS, encode(BOOKINGS, &booking)?)
            .await
            .map_err(|err| record_error(BOOKINGS, ErrorCode::BookingNotFound, err))?;
        info!(
            reference = booking.reference.as_str(),
            tour_id = %tour.id,
            user_id = %identity.id,
            total = %booking.final_total,
            "booking created"
        );
        decode(BOOKINGS, row)
    }

    /// Bookings made by `user`, newest first.
    pub async fn list_for_traveler(&self, user: &UserId) -> Result<Vec<Booking>, DomainError> {
        let filter = RecordFilter::all()
            .eq("user_id", user.as_str())
            .order_by("created_at", SortOrder::Descending);
        let rows = self
            .records
            .query(BOOKINGS, &filter)
            .await
            .map_err(|err| record_error(BOOKINGS, ErrorCode::BookingNotFound, err))?;
        decode_all(BOOKINGS, rows)
    }

    /// Cancels a booking owned by `identity`. Admins may cancel any booking.
    pub async fn cancel(&self, id: &BookingId, identity: &Identity) -> Result<Booking, DomainError> {
        let filter = RecordFilter::all().eq("id", id.to_string()).limit(1);
        let row = self
            .records
            .query(BOOKINGS, &filter)
            .await
            .map_err(|err| record_error(BOOKINGS, ErrorCode::BookingNotFound, err))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DomainError::new(ErrorCode::BookingNotFound, "Booking not found")
                    .with_detail("id", id.to_string())
            })?;
        let mut booking: Booking = decode(BOOKINGS, row)?;

        if booking.user_id != identity.id && identity.role != Role::Admin {
            return Err(DomainError::new(ErrorCode::Forbidden, "You can only cancel your own bookings")
                .with_detail("id", id.to_string()));
        }
        booking.cancel()?;

        let patch = serde_json::json!({ "status": booking.status });
        let row = self
            .records
            .update(BOOKINGS, &id.to_string(), patch)
            .await
            .map_err(|err| record_error(BOOKINGS, ErrorCode::BookingNotFound, err))?;
        info!(reference = booking.reference.as_str(), "booking cancelled");
        decode(BOOKINGS, row)
    }
}
