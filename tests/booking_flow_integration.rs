//! Integration tests for the checkout wizard.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use tourbook::adapters::collaborator::Operation;
use tourbook::adapters::{InMemoryCollaborator, InMemorySessionSlot};
use tourbook::application::{
    BookingFlow, BookingLedger, BookingStep, SessionStore, SubmitOutcome, Wizard,
};
use tourbook::config::OtpConfig;
use tourbook::domain::booking::{BookingReference, TourSummary};
use tourbook::domain::foundation::{AuthError, Role, TourId};
use tourbook::domain::pricing::{Amount, PricingPolicy};

// =============================================================================
// Test Infrastructure
// =============================================================================

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "secret-1";

struct Harness {
    collaborator: InMemoryCollaborator,
    store: Arc<SessionStore>,
    tour: TourSummary,
}

impl Harness {
    async fn new() -> Self {
        let collaborator =
            InMemoryCollaborator::new().with_account(EMAIL, PASSWORD, Some("Ada"), Role::Guest);
        let store = SessionStore::start(
            Arc::new(collaborator.clone()),
            Arc::new(InMemorySessionSlot::new()),
            OtpConfig::default(),
        );
        store.ready().await;
        let tour = TourSummary {
            id: TourId::new(),
            title: "Glacier Walk".to_string(),
            location: "Iceland".to_string(),
            price: Amount::new(25_000),
            original_price: Some(Amount::new(30_000)),
            max_group_size: 8,
            duration_days: 1,
            image_url: None,
        };
        Self {
            collaborator,
            store,
            tour,
        }
    }

    async fn signed_in() -> Self {
        let harness = Self::new().await;
        harness.store.sign_in(EMAIL, PASSWORD).await.unwrap();
        harness
    }

    fn wizard(&self) -> Wizard<BookingFlow> {
        let ledger = Arc::new(BookingLedger::new(Arc::new(self.collaborator.clone())));
        let flow = BookingFlow::new(
            Arc::clone(&self.store),
            ledger,
            self.tour.clone(),
            PricingPolicy::default(),
        )
        .with_today(today());
        Wizard::new(flow)
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn fill_options(wizard: &Wizard<BookingFlow>) {
    wizard.set_field("travel_date", "2025-07-15");
    wizard.set_field("traveler_count", "2");
}

fn fill_guest(wizard: &Wizard<BookingFlow>) {
    wizard.set_field("first_name", "Ada");
    wizard.set_field("last_name", "Lovelace");
    wizard.set_field("email", EMAIL);
    wizard.set_field("phone", "+44 20 7946 0000");
}

fn fill_payment(wizard: &Wizard<BookingFlow>) {
    wizard.set_field("payment_method", "card");
    wizard.set_field("terms_accepted", "on");
}

async fn walk_to_payment(wizard: &Wizard<BookingFlow>) {
    fill_options(wizard);
    assert_eq!(
        wizard.submit().await,
        SubmitOutcome::Advanced(BookingStep::GuestDetails)
    );
    fill_guest(wizard);
    assert_eq!(wizard.submit().await, SubmitOutcome::Advanced(BookingStep::Payment));
    fill_payment(wizard);
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn happy_path_confirms_with_bt_reference() {
    let harness = Harness::signed_in().await;
    let wizard = harness.wizard();
    walk_to_payment(&wizard).await;

    let quote = wizard.quote();
    assert_eq!(quote.total_price, Amount::new(50_000));
    assert_eq!(quote.service_fee, Amount::new(2_500));
    assert_eq!(quote.final_total, Amount::new(52_500));
    assert_eq!(wizard.flow().tour().discount().value(), 17);

    assert_eq!(wizard.submit().await, SubmitOutcome::Completed);
    assert_eq!(wizard.current_step(), BookingStep::Confirmation);

    let reference = wizard.booking_reference().unwrap();
    assert!(reference.starts_with("BT"));
    assert!(reference[2..].chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(BookingReference::parse(&reference).is_ok());

    let rows = harness.collaborator.rows("bookings");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["reference"], Value::String(reference));
    assert_eq!(rows[0]["final_total"], Value::from(52_500));
}

#[tokio::test]
async fn confirmation_is_terminal() {
    let harness = Harness::signed_in().await;
    let wizard = harness.wizard();
    walk_to_payment(&wizard).await;
    wizard.submit().await;

    assert_eq!(wizard.submit().await, SubmitOutcome::Ignored);
    assert!(!wizard.back());
    assert_eq!(harness.collaborator.call_count(Operation::Insert), 1);
}

// =============================================================================
// Navigation and Validation
// =============================================================================

#[tokio::test]
async fn back_navigation_keeps_entered_fields() {
    let harness = Harness::signed_in().await;
    let wizard = harness.wizard();
    walk_to_payment(&wizard).await;

    assert!(wizard.back());
    assert_eq!(wizard.current_step(), BookingStep::GuestDetails);
    assert_eq!(wizard.field("first_name"), "Ada");
    assert!(wizard.back());
    assert_eq!(wizard.current_step(), BookingStep::OptionsSelection);
    assert!(!wizard.back());
    assert_eq!(wizard.field("traveler_count"), "2");
}

#[tokio::test]
async fn invalid_options_block_without_remote_calls() {
    let harness = Harness::signed_in().await;
    let wizard = harness.wizard();
    wizard.set_field("travel_date", "2025-06-01");
    wizard.set_field("traveler_count", "9");
    wizard.set_field("child_ages", "4, 20");

    let SubmitOutcome::Blocked(errors) = wizard.submit().await else {
        panic!("expected validation to block");
    };

    assert_eq!(
        errors,
        vec![
            "Travel date must be in the future".to_string(),
            "Traveler count must be between 1 and 8".to_string(),
            "Child age must be between 0 and 17".to_string(),
        ]
    );
    assert_eq!(wizard.current_step(), BookingStep::OptionsSelection);
}

#[tokio::test]
async fn payment_requires_method_and_terms() {
    let harness = Harness::signed_in().await;
    let wizard = harness.wizard();
    walk_to_payment(&wizard).await;
    wizard.set_field("payment_method", "");
    wizard.set_field("terms_accepted", "");

    let SubmitOutcome::Blocked(errors) = wizard.submit().await else {
        panic!("expected validation to block");
    };
    assert_eq!(errors.len(), 2);
    assert_eq!(harness.collaborator.call_count(Operation::Insert), 0);
}

// =============================================================================
// Sign-in Detour
// =============================================================================

#[tokio::test]
async fn anonymous_payment_remembers_redirect() {
    let harness = Harness::new().await;
    let wizard = harness.wizard();
    walk_to_payment(&wizard).await;

    let outcome = wizard.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed(AuthError::NotAuthenticated.user_message())
    );
    assert_eq!(wizard.current_step(), BookingStep::Payment);

    let signed_in = harness.store.sign_in(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(
        signed_in.redirect_to,
        Some(format!("/tours/{}/book", harness.tour.id))
    );

    assert_eq!(wizard.submit().await, SubmitOutcome::Completed);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn double_trigger_issues_one_remote_call() {
    let harness = Harness::signed_in().await;
    let wizard = Arc::new(harness.wizard());
    walk_to_payment(&wizard).await;
    harness.collaborator.hold_responses();

    let first = {
        let wizard = Arc::clone(&wizard);
        tokio::spawn(async move { wizard.submit().await })
    };
    while harness.collaborator.call_count(Operation::Insert) == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(wizard.submit().await, SubmitOutcome::Ignored);
    harness.collaborator.release_responses();

    assert_eq!(first.await.unwrap(), SubmitOutcome::Completed);
    assert_eq!(harness.collaborator.call_count(Operation::Insert), 1);
}
