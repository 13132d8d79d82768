//! Checkout wizard for one tour.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use super::messages;
use crate::application::records::BookingLedger;
use crate::application::session_store::SessionStore;
use crate::application::wizard::{FlowError, StepEffect, StepFlow, Wizard};
use crate::domain::booking::{validate_options, BookingDraft, GuestDetails, PaymentMethod, TourSummary};
use crate::domain::foundation::{AuthError, StateMachine, Timestamp};
use crate::domain::pricing::{PriceQuote, PricingPolicy};
use crate::domain::wizard::{is_reachable_step, reachable_steps, FormFields, TransientNotice, WizardStep};

pub const TRAVEL_DATE_FIELD: &str = "travel_date";
pub const TRAVELER_COUNT_FIELD: &str = "traveler_count";
/// Comma-separated ages, e.g. `"4, 9"`.
pub const CHILD_AGES_FIELD: &str = "child_ages";
pub const FIRST_NAME_FIELD: &str = "first_name";
pub const LAST_NAME_FIELD: &str = "last_name";
pub const GUEST_EMAIL_FIELD: &str = "email";
pub const PHONE_FIELD: &str = "phone";
pub const COUNTRY_FIELD: &str = "country";
pub const SPECIAL_REQUESTS_FIELD: &str = "special_requests";
pub const PAYMENT_METHOD_FIELD: &str = "payment_method";
pub const TERMS_FIELD: &str = "terms_accepted";
pub const REFERENCE_FIELD: &str = "booking_reference";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStep {
    OptionsSelection,
    GuestDetails,
    Payment,
    Confirmation,
}

impl StateMachine for BookingStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        is_reachable_step(self, target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        reachable_steps(self)
    }
}

impl WizardStep for BookingStep {
    const ORDER: &'static [Self] = &[
        BookingStep::OptionsSelection,
        BookingStep::GuestDetails,
        BookingStep::Payment,
        BookingStep::Confirmation,
    ];

    fn name(&self) -> &'static str {
        match self {
            BookingStep::OptionsSelection => "options_selection",
            BookingStep::GuestDetails => "guest_details",
            BookingStep::Payment => "payment",
            BookingStep::Confirmation => "confirmation",
        }
    }
}

/// Checkout for the tour handed off from the listing page.
pub struct BookingFlow {
    store: Arc<SessionStore>,
    ledger: Arc<BookingLedger>,
    tour: TourSummary,
    pricing: PricingPolicy,
    today: Option<NaiveDate>,
}

impl BookingFlow {
    pub fn new(
        store: Arc<SessionStore>,
        ledger: Arc<BookingLedger>,
        tour: TourSummary,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            store,
            ledger,
            tour,
            pricing,
            today: None,
        }
    }

    /// Pins the date travel dates are compared against.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn tour(&self) -> &TourSummary {
        &self.tour
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Timestamp::now().date())
    }

    /// Pricing for `traveler_count` travelers, at least one.
    pub fn quote_for(&self, traveler_count: u32) -> PriceQuote {
        PriceQuote::compute(self.tour.price, traveler_count.max(1), &self.pricing)
    }

    fn draft(&self, fields: &FormFields) -> Result<BookingDraft, FlowError> {
        let travel_date = fields
            .parse::<NaiveDate>(TRAVEL_DATE_FIELD)
            .ok_or_else(|| FlowError::rejected("Select a travel date"))?;
        let payment_method = fields
            .trimmed(PAYMENT_METHOD_FIELD)
            .parse::<PaymentMethod>()
            .map_err(|err| FlowError::rejected(err.user_message()))?;
        Ok(BookingDraft {
            travel_date,
            traveler_count: fields.parse(TRAVELER_COUNT_FIELD).unwrap_or(0),
            child_ages: child_ages(fields).map_err(FlowError::rejected)?,
            guest: guest_details(fields),
            special_requests: optional(fields, SPECIAL_REQUESTS_FIELD),
            payment_method,
        })
    }
}

#[async_trait]
impl StepFlow for BookingFlow {
    type Step = BookingStep;
    const NAME: &'static str = "booking";

    fn validate(&self, step: BookingStep, fields: &FormFields) -> Vec<String> {
        match step {
            BookingStep::OptionsSelection => {
                let ages = match child_ages(fields) {
                    Ok(ages) => ages,
                    Err(message) => return vec![message],
                };
                messages(validate_options(
                    fields.parse(TRAVEL_DATE_FIELD),
                    self.today(),
                    fields.parse(TRAVELER_COUNT_FIELD).unwrap_or(0),
                    self.tour.max_group_size,
                    &ages,
                ))
            }
            BookingStep::GuestDetails => messages(guest_details(fields).validate()),
            BookingStep::Payment => {
                let mut errors = Vec::new();
                if let Err(err) = fields.trimmed(PAYMENT_METHOD_FIELD).parse::<PaymentMethod>() {
                    errors.push(err.user_message());
                }
                if !fields.flag(TERMS_FIELD) {
                    errors.push("You must accept the terms and conditions".to_string());
                }
                errors
            }
            BookingStep::Confirmation => Vec::new(),
        }
    }

    fn has_action(&self, step: BookingStep) -> bool {
        step == BookingStep::Payment
    }

    async fn run_action(
        &self,
        _step: BookingStep,
        fields: FormFields,
    ) -> Result<StepEffect<BookingStep>, FlowError> {
        let Some(identity) = self.store.current_identity() else {
            let target = self.tour.booking_path();
            info!(target = %target, "booking needs sign-in; remembering redirect");
            self.store.remember_redirect(&target);
            return Err(FlowError::Auth(AuthError::NotAuthenticated));
        };

        let draft = self.draft(&fields)?;
        let quote = self.quote_for(draft.traveler_count);
        let booking = self.ledger.create(draft, &self.tour, &identity, &quote).await?;

        Ok(StepEffect::advance()
            .with_field(REFERENCE_FIELD, booking.reference.as_str())
            .with_notice(TransientNotice::success(format!(
                "Booking confirmed: {}",
                booking.reference
            ))))
    }

    fn allows_back(&self, step: BookingStep) -> bool {
        step != BookingStep::Confirmation
    }
}

impl Wizard<BookingFlow> {
    /// Derived pricing for the traveler count currently entered.
    pub fn quote(&self) -> PriceQuote {
        let count = self.state().fields.parse(TRAVELER_COUNT_FIELD).unwrap_or(1);
        self.flow().quote_for(count)
    }

    /// Reference of the confirmed booking, once on the confirmation step.
    pub fn booking_reference(&self) -> Option<String> {
        Some(self.field(REFERENCE_FIELD)).filter(|reference| !reference.is_empty())
    }
}

fn child_ages(fields: &FormFields) -> Result<Vec<u8>, String> {
    fields
        .trimmed(CHILD_AGES_FIELD)
        .split(',')
        .map(str::trim)
        .filter(|age| !age.is_empty())
        .map(|age| {
            age.parse::<u8>()
                .map_err(|_| format!("'{}' is not a valid child age", age))
        })
        .collect()
}

fn guest_details(fields: &FormFields) -> GuestDetails {
    GuestDetails {
        first_name: fields.trimmed(FIRST_NAME_FIELD).to_string(),
        last_name: fields.trimmed(LAST_NAME_FIELD).to_string(),
        email: fields.trimmed(GUEST_EMAIL_FIELD).to_string(),
        phone: fields.trimmed(PHONE_FIELD).to_string(),
        country: optional(fields, COUNTRY_FIELD),
    }
}

fn optional(fields: &FormFields, name: &str) -> Option<String> {
    Some(fields.trimmed(name))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_ages_parse_comma_separated_list() {
        let fields = FormFields::new().with(CHILD_AGES_FIELD, " 4, 9 ,");
        assert_eq!(child_ages(&fields), Ok(vec![4, 9]));
        assert_eq!(child_ages(&FormFields::new()), Ok(vec![]));

        let bad = FormFields::new().with(CHILD_AGES_FIELD, "4, ten");
        assert_eq!(child_ages(&bad), Err("'ten' is not a valid child age".to_string()));
    }

    #[test]
    fn optional_fields_drop_blank_values() {
        let fields = FormFields::new().with(COUNTRY_FIELD, "  ").with(SPECIAL_REQUESTS_FIELD, "Window seat");
        assert_eq!(optional(&fields, COUNTRY_FIELD), None);
        assert_eq!(optional(&fields, SPECIAL_REQUESTS_FIELD).as_deref(), Some("Window seat"));
    }
}
