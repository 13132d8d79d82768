//! Integration tests for the password reset wizard.

use std::sync::Arc;

use tourbook::adapters::collaborator::Operation;
use tourbook::adapters::{InMemoryCollaborator, InMemorySessionSlot};
use tourbook::application::{
    submit_code, OtpPrompt, PasswordResetFlow, PasswordResetStep, SessionStore, SubmitOutcome,
    Wizard,
};
use tourbook::config::OtpConfig;
use tourbook::domain::foundation::Role;
use tourbook::ports::OtpPurpose;

// =============================================================================
// Test Infrastructure
// =============================================================================

const EMAIL: &str = "grace@example.com";

async fn setup() -> (InMemoryCollaborator, Arc<SessionStore>) {
    let collaborator = InMemoryCollaborator::new()
        .with_account(EMAIL, "old-password", Some("Grace"), Role::Guest);
    let store = SessionStore::start(
        Arc::new(collaborator.clone()),
        Arc::new(InMemorySessionSlot::new()),
        OtpConfig::default(),
    );
    store.ready().await;
    (collaborator, store)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn full_reset_sets_new_password_and_clears_pending() {
    let (collaborator, store) = setup().await;
    let wizard = Wizard::new(PasswordResetFlow::new(Arc::clone(&store)));
    wizard.set_field("email", EMAIL);

    assert_eq!(
        wizard.submit().await,
        SubmitOutcome::Advanced(PasswordResetStep::OneTimeCodeEntry)
    );
    assert_eq!(store.pending().email(), Some(EMAIL));
    assert!(wizard.state().notice.is_some());

    let prompt = OtpPrompt::mount(Arc::clone(&store), OtpPurpose::Recovery);
    let code = collaborator.issued_code(EMAIL).unwrap();
    assert_eq!(
        submit_code(&wizard, &prompt, &code).await,
        SubmitOutcome::Advanced(PasswordResetStep::NewPassword)
    );
    // Still pending until the new password is saved.
    assert_eq!(store.pending().email(), Some(EMAIL));
    assert!(store.current_identity().is_some());

    wizard.set_field("password", "new-password");
    wizard.set_field("password_confirmation", "new-password");
    assert_eq!(wizard.submit().await, SubmitOutcome::Completed);

    assert!(!store.pending().is_pending());
    assert!(collaborator.password_matches(EMAIL, "new-password"));
    assert!(!collaborator.password_matches(EMAIL, "old-password"));
}

#[tokio::test]
async fn unknown_address_looks_the_same_but_sends_nothing() {
    let (collaborator, store) = setup().await;
    let wizard = Wizard::new(PasswordResetFlow::new(Arc::clone(&store)));
    wizard.set_field("email", "nobody@example.com");

    assert_eq!(
        wizard.submit().await,
        SubmitOutcome::Advanced(PasswordResetStep::OneTimeCodeEntry)
    );
    assert!(collaborator.mailbox("nobody@example.com").is_empty());
}

#[tokio::test]
async fn short_password_is_blocked_locally() {
    let (collaborator, store) = setup().await;
    let wizard = Wizard::new(PasswordResetFlow::new(Arc::clone(&store)));
    wizard.set_field("email", EMAIL);
    wizard.submit().await;
    let code = collaborator.issued_code(EMAIL).unwrap();
    wizard.set_field("code", code);
    wizard.submit().await;

    wizard.set_field("password", "abc");
    wizard.set_field("password_confirmation", "abc");
    let outcome = wizard.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Blocked(vec!["Password must be at least 6 characters".to_string()])
    );
    assert_eq!(wizard.current_step(), PasswordResetStep::NewPassword);
    assert_eq!(collaborator.call_count(Operation::UpdateCredentials), 0);
}

#[tokio::test]
async fn service_failure_on_email_step_stays_put() {
    let (collaborator, store) = setup().await;
    collaborator.force_error(
        Operation::SendRecoveryCode,
        tourbook::ports::GatewayError::network("connection reset"),
    );
    let wizard = Wizard::new(PasswordResetFlow::new(Arc::clone(&store)));
    wizard.set_field("email", EMAIL);

    let outcome = wizard.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Failed(message) if message.contains("try again")));
    assert_eq!(wizard.current_step(), PasswordResetStep::EmailEntry);
    assert!(!store.pending().is_pending());
}
