//! Stored booking record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookingDraft, BookingReference, GuestDetails, PaymentMethod};
use crate::domain::foundation::{
    BookingId, DomainError, ErrorCode, StateMachine, Timestamp, TourId, UserId,
};
use crate::domain::pricing::{Amount, PriceQuote};

/// Lifecycle of a stored booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
}

impl StateMachine for BookingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (BookingStatus::Confirmed, BookingStatus::Cancelled))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            BookingStatus::Confirmed => vec![BookingStatus::Cancelled],
            BookingStatus::Cancelled => vec![],
        }
    }
}

/// A confirmed booking as persisted in the `bookings` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub reference: BookingReference,
    pub tour_id: TourId,
    pub user_id: UserId,
    pub travel_date: NaiveDate,
    pub traveler_count: u32,
    #[serde(default)]
    pub child_ages: Vec<u8>,
    pub guest: GuestDetails,
    #[serde(default)]
    pub special_requests: Option<String>,
    pub payment_method: PaymentMethod,
    pub total_price: Amount,
    pub service_fee: Amount,
    #[serde(default)]
    pub tax: Option<Amount>,
    pub final_total: Amount,
    pub status: BookingStatus,
    pub created_at: Timestamp,
}

impl Booking {
    /// Builds a confirmed booking from a submitted draft and its quote.
    pub fn confirm(draft: BookingDraft, tour_id: TourId, user_id: UserId, quote: &PriceQuote) -> Self {
        Self {
            id: BookingId::new(),
            reference: BookingReference::generate(),
            tour_id,
            user_id,
            travel_date: draft.travel_date,
            traveler_count: draft.traveler_count,
            child_ages: draft.child_ages,
            guest: draft.guest,
            special_requests: draft.special_requests,
            payment_method: draft.payment_method,
            total_price: quote.total_price,
            service_fee: quote.service_fee,
            tax: quote.tax,
            final_total: quote.final_total,
            status: BookingStatus::Confirmed,
            created_at: Timestamp::now(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Cancels the booking.
    ///
    /// # Errors
    ///
    /// `BookingAlreadyCancelled` if it was cancelled before.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.status = self.status.transition_to(BookingStatus::Cancelled).map_err(|_| {
            DomainError::new(
                ErrorCode::BookingAlreadyCancelled,
                "Booking is already cancelled",
            )
            .with_detail("reference", self.reference.as_str())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::PricingPolicy;

    fn booking() -> Booking {
        let draft = BookingDraft {
            travel_date: NaiveDate::from_ymd_opt(2030, 1, 10).unwrap(),
            traveler_count: 2,
            child_ages: vec![],
            guest: GuestDetails {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "123".to_string(),
                country: Some("UK".to_string()),
            },
            special_requests: None,
            payment_method: PaymentMethod::Card,
        };
        let quote = PriceQuote::compute(Amount::new(25_000), 2, &PricingPolicy::default());
        Booking::confirm(draft, TourId::new(), UserId::new("user-1").unwrap(), &quote)
    }

    #[test]
    fn confirm_copies_quote_and_generates_reference() {
        let booking = booking();
        assert_eq!(booking.final_total, Amount::new(52_500));
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.reference.as_str().starts_with("BT"));
    }

    #[test]
    fn cancel_only_once() {
        let mut booking = booking();
        booking.cancel().unwrap();
        assert!(booking.is_cancelled());

        let err = booking.cancel().unwrap_err();
        assert_eq!(err.code, ErrorCode::BookingAlreadyCancelled);
    }

    #[test]
    fn record_round_trips_through_json() {
        let booking = booking();
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["status"], "confirmed");
        let back: Booking = serde_json::from_value(value).unwrap();
        assert_eq!(back, booking);
    }
}
