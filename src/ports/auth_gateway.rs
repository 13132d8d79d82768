//! Auth gateway port for the hosted authentication service.
//!
//! Every account, sign-in and one-time-code operation goes through this
//! port. Implementations return raw [`GatewayError`]s; classification into
//! user-facing [`AuthError`] kinds happens once, in the `From` impl below.
//!
//! # Example
//!
//! ```ignore
//! async fn sign_in(gateway: Arc<dyn AuthGateway>, email: &EmailAddress) -> Result<Identity, AuthError> {
//!     let password = SecretString::new("correct horse".to_string());
//!     Ok(gateway.sign_in(email, &password).await?)
//! }
//! ```

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::foundation::{AuthError, EmailAddress, Identity, Role};

/// What a one-time code was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    /// Confirms the address of a newly created account.
    Signup,
    /// Passwordless sign-in to an existing account.
    Email,
    /// Proves ownership before a password reset.
    Recovery,
}

impl OtpPurpose {
    /// Name the hosted service uses for this code type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "signup",
            OtpPurpose::Email => "email",
            OtpPurpose::Recovery => "recovery",
        }
    }
}

/// Input for account creation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: EmailAddress,
    pub password: SecretString,
    pub display_name: Option<String>,
    pub role: Role,
}

/// Result of account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCreated {
    /// The account as the service reports it, if it reported one.
    pub identity: Option<Identity>,

    /// True when the address must be confirmed before a session exists.
    pub needs_email_confirmation: bool,

    /// True when the service answered with a user that has no linked
    /// identities, which is how it reports an already-registered address
    /// while confirmation is enabled.
    pub identities_empty: bool,
}

/// Out-of-band session notification pushed by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Identity),
    TokenRefreshed(Identity),
    UserUpdated(Identity),
    SignedOut,
}

impl SessionChange {
    /// The identity carried by the notification, `None` for sign-out.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionChange::SignedIn(identity)
            | SessionChange::TokenRefreshed(identity)
            | SessionChange::UserUpdated(identity) => Some(identity),
            SessionChange::SignedOut => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SessionChange::SignedIn(_) => "signed_in",
            SessionChange::TokenRefreshed(_) => "token_refreshed",
            SessionChange::UserUpdated(_) => "user_updated",
            SessionChange::SignedOut => "signed_out",
        }
    }
}

/// Raw failure reported by the hosted service or the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GatewayError {
    /// Machine-readable error code, when the service sent one.
    pub code: Option<String>,
    /// Human-readable text as received.
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// A transport-level failure (timeout, refused connection).
    pub fn network(message: impl Into<String>) -> Self {
        Self::with_code("network_error", message)
    }
}

impl From<GatewayError> for AuthError {
    fn from(err: GatewayError) -> Self {
        AuthError::classify(err.code.as_deref(), &err.message)
    }
}

/// Authentication operations of the hosted service.
///
/// # Contract
///
/// Implementations must:
/// - Push a [`SessionChange`] to every subscriber when their own session
///   state changes (sign-in, verification, credential update, sign-out)
/// - Return `Ok(())` from `sign_out` even when no session exists
/// - Never reveal whether an address exists from `send_recovery_code`
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Creates an account, sending a confirmation code if the service
    /// requires one.
    async fn create_account(&self, account: &NewAccount) -> Result<AccountCreated, GatewayError>;

    /// Signs in with email and password.
    async fn sign_in(
        &self,
        email: &EmailAddress,
        password: &SecretString,
    ) -> Result<Identity, GatewayError>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<(), GatewayError>;

    /// Returns the identity of an existing session, if any.
    async fn get_session(&self) -> Result<Option<Identity>, GatewayError>;

    /// Registers for session-change notifications.
    ///
    /// Dropping the receiver unregisters.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;

    /// Sends a sign-in code, optionally creating the account.
    async fn send_one_time_code(
        &self,
        email: &EmailAddress,
        create_if_missing: bool,
    ) -> Result<(), GatewayError>;

    /// Verifies a code; on success a session exists and its identity is
    /// returned when the service includes it.
    async fn verify_one_time_code(
        &self,
        email: &EmailAddress,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Identity>, GatewayError>;

    /// Issues a fresh code of the same purpose, invalidating the previous one.
    async fn resend_one_time_code(
        &self,
        email: &EmailAddress,
        purpose: OtpPurpose,
    ) -> Result<(), GatewayError>;

    /// Sends a password-recovery code.
    async fn send_recovery_code(&self, email: &EmailAddress) -> Result<(), GatewayError>;

    /// Sends a sign-in link as an alternative to the code.
    async fn send_magic_link(&self, email: &EmailAddress) -> Result<(), GatewayError>;

    /// Sets a new password for the signed-in account.
    async fn update_credentials(&self, password: &SecretString) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_classifies_by_code() {
        let err: AuthError = GatewayError::with_code("email_exists", "exists").into();
        assert_eq!(err, AuthError::AlreadyRegistered);
    }

    #[test]
    fn network_error_is_generic_failure() {
        let err: AuthError = GatewayError::network("timed out").into();
        assert_eq!(err, AuthError::NetworkOrServiceFailure("timed out".to_string()));
    }

    #[test]
    fn session_change_exposes_identity() {
        assert!(SessionChange::SignedOut.identity().is_none());
        assert_eq!(SessionChange::SignedOut.kind(), "signed_out");
    }
}
