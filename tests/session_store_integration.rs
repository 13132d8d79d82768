//! Integration tests for the session store.
//!
//! Covers the initialization phase, explicit operations, and how pushed
//! session changes interleave with them.

use std::sync::Arc;

use tourbook::adapters::collaborator::{Operation, SentMailKind};
use tourbook::adapters::{InMemoryCollaborator, InMemorySessionSlot};
use tourbook::application::{SessionPhase, SessionStore};
use tourbook::config::OtpConfig;
use tourbook::domain::foundation::{AuthError, Identity, Role, UserId};
use tourbook::ports::{GatewayError, SessionChange};

// =============================================================================
// Test Infrastructure
// =============================================================================

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "secret-1";

fn start(collaborator: &InMemoryCollaborator) -> Arc<SessionStore> {
    SessionStore::start(
        Arc::new(collaborator.clone()),
        Arc::new(InMemorySessionSlot::new()),
        OtpConfig::default(),
    )
}

fn seeded() -> InMemoryCollaborator {
    InMemoryCollaborator::new().with_account(EMAIL, PASSWORD, Some("Ada"), Role::Guest)
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn phase_is_unknown_until_lookup_resolves() {
    let collaborator = seeded().with_session(EMAIL);
    collaborator.hold_responses();
    let store = start(&collaborator);

    assert_eq!(store.phase(), SessionPhase::Unknown);
    assert!(store.current_identity().is_none());

    collaborator.release_responses();
    store.ready().await;
    assert_eq!(store.current_identity().unwrap().email, EMAIL);
}

// =============================================================================
// Sign-out
// =============================================================================

#[tokio::test]
async fn sign_out_is_idempotent() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;

    store.sign_out().await;
    store.sign_out().await;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Anonymous);
    assert!(!snapshot.pending.is_pending());
}

#[tokio::test]
async fn sign_out_clears_identity_and_pending_even_when_remote_fails() {
    let collaborator = seeded().with_email_confirmation(true);
    let store = start(&collaborator);
    store.ready().await;
    store
        .sign_up("new@example.com", PASSWORD, "New", false)
        .await
        .unwrap();
    assert!(store.pending().is_pending());

    collaborator.force_error(Operation::SignOut, GatewayError::network("offline"));
    store.sign_out().await;

    assert!(!store.pending().is_pending());
    assert!(store.current_identity().is_none());
}

// =============================================================================
// Sign-in
// =============================================================================

#[tokio::test]
async fn unconfirmed_sign_in_becomes_pending() {
    let collaborator = InMemoryCollaborator::new().with_email_confirmation(true);
    let store = start(&collaborator);
    store.ready().await;
    store.sign_up(EMAIL, PASSWORD, "Ada", false).await.unwrap();
    store.clear_pending();

    let err = store.sign_in(EMAIL, PASSWORD).await.unwrap_err();

    assert_eq!(err, AuthError::EmailNotConfirmed);
    assert_eq!(store.pending().email(), Some(EMAIL));
}

#[tokio::test]
async fn passwordless_code_signs_in() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;

    store.request_sign_in_code(EMAIL).await.unwrap();
    let code = collaborator.issued_code(EMAIL).unwrap();

    let signed_in = store.verify_sign_in_code(&code).await.unwrap().unwrap();
    assert_eq!(signed_in.identity.email, EMAIL);
    assert_eq!(store.current_identity(), Some(signed_in.identity));
    assert!(!store.pending().is_pending());
}

#[tokio::test]
async fn code_sign_in_returns_and_clears_redirect() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;
    store.remember_redirect("/tours/42/book");

    store.request_sign_in_code(EMAIL).await.unwrap();
    let code = collaborator.issued_code(EMAIL).unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    // A rejected code leaves the target for the next attempt.
    assert_eq!(store.verify_sign_in_code(wrong).await.unwrap(), None);

    let signed_in = store.verify_sign_in_code(&code).await.unwrap().unwrap();
    assert_eq!(signed_in.redirect_to.as_deref(), Some("/tours/42/book"));
    assert_eq!(store.take_redirect(), None);
}

#[tokio::test]
async fn new_pending_address_starts_with_fresh_attempts() {
    let collaborator = InMemoryCollaborator::new().with_email_confirmation(true);
    let store = start(&collaborator);
    store.ready().await;
    store.sign_up("bob@example.com", PASSWORD, "Bob", false).await.unwrap();
    store.clear_pending();

    store.sign_up(EMAIL, PASSWORD, "Ada", false).await.unwrap();
    let ada_code = collaborator.issued_code(EMAIL).unwrap();
    let wrong = if ada_code == "000000" { "111111" } else { "000000" };
    for _ in 0..5 {
        assert!(!store.verify_one_time_code(wrong).await.unwrap());
    }
    assert_eq!(store.failed_attempts(), 5);

    let err = store.sign_in("bob@example.com", PASSWORD).await.unwrap_err();
    assert_eq!(err, AuthError::EmailNotConfirmed);
    assert_eq!(store.pending().email(), Some("bob@example.com"));
    assert_eq!(store.failed_attempts(), 0);

    let bob_code = collaborator.issued_code("bob@example.com").unwrap();
    assert_eq!(store.verify_one_time_code(&bob_code).await, Ok(true));
    assert_eq!(store.current_identity().unwrap().email, "bob@example.com");
}

#[tokio::test]
async fn magic_link_is_mailed() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;

    store.send_magic_link(EMAIL).await.unwrap();

    let mail = collaborator.mailbox(EMAIL);
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].kind, SentMailKind::MagicLink);
}

// =============================================================================
// Pushed Changes
// =============================================================================

#[tokio::test]
async fn pushed_sign_out_after_sign_in_wins() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;
    store.sign_in(EMAIL, PASSWORD).await.unwrap();

    let mut rx = store.watch();
    collaborator.push_change(SessionChange::SignedOut);
    rx.wait_for(|snapshot| snapshot.phase == SessionPhase::Anonymous)
        .await
        .unwrap();

    assert!(store.current_identity().is_none());
}

#[tokio::test]
async fn pushed_profile_update_replaces_identity() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;
    let signed_in = store.sign_in(EMAIL, PASSWORD).await.unwrap().identity;

    let updated = Identity::new(
        signed_in.id.clone(),
        EMAIL,
        Some("Countess Lovelace".to_string()),
        Role::Guest,
        true,
    );
    let mut rx = store.watch();
    collaborator.push_change(SessionChange::UserUpdated(updated.clone()));
    rx.wait_for(|snapshot| snapshot.identity() == Some(&updated))
        .await
        .unwrap();

    assert_eq!(store.current_identity(), Some(updated));
}

#[tokio::test]
async fn explicit_sign_in_after_pushed_sign_out_wins() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;

    let mut rx = store.watch();
    collaborator.push_change(SessionChange::SignedIn(Identity::new(
        UserId::new("other").unwrap(),
        "other@example.com",
        None,
        Role::Guest,
        true,
    )));
    rx.wait_for(|snapshot| snapshot.identity().is_some())
        .await
        .unwrap();

    let signed_in = store.sign_in(EMAIL, PASSWORD).await.unwrap();
    // Let the listener drain the sign-in notification too.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(store.current_identity(), Some(signed_in.identity));
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test]
async fn shutdown_during_initial_lookup_resolves_anonymous() {
    let collaborator = seeded().with_session(EMAIL);
    collaborator.hold_responses();
    let store = start(&collaborator);
    assert_eq!(store.phase(), SessionPhase::Unknown);

    store.shutdown();

    store.ready().await;
    assert_eq!(store.phase(), SessionPhase::Anonymous);
    collaborator.release_responses();
}

#[tokio::test]
async fn dropping_the_store_stops_its_tasks() {
    let collaborator = seeded();
    let store = start(&collaborator);
    store.ready().await;
    let rx = store.watch();

    drop(store);
    tokio::task::yield_now().await;

    assert!(rx.has_changed().is_err());
}
