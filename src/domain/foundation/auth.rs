//! Authentication types for the domain layer.
//!
//! These types describe who is signed in and why an authentication attempt
//! failed. They carry no dependency on the hosted auth service: gateway
//! adapters populate them, and `AuthError::classify` maps raw service
//! failures onto the closed set of user-facing kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::UserId;

/// Role an account holds in the booking application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Travelers booking tours and hotels.
    #[default]
    Guest,
    /// Operators listing their own tours.
    Host,
    /// Staff managing every listing.
    Admin,
}

impl Role {
    /// Parses the role stored in account metadata. Unknown values are guests.
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("host") => Role::Host,
            Some("admin") => Role::Admin,
            _ => Role::Guest,
        }
    }

    /// Value written to account metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Host => "host",
            Role::Admin => "admin",
        }
    }

    /// Returns true if this role may manage tour listings.
    pub fn can_manage_tours(&self) -> bool {
        matches!(self, Role::Host | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The currently authenticated account.
///
/// Owned exclusively by the session store; views read clones of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The unique user identifier from the auth service.
    pub id: UserId,

    /// Email address the account signs in with.
    pub email: String,

    /// Display name if the account has one.
    pub display_name: Option<String>,

    /// Role used for admin-panel gating.
    pub role: Role,

    /// Whether email ownership has been confirmed.
    pub email_verified: bool,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        display_name: Option<String>,
        role: Role,
        email_verified: bool,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            display_name,
            role,
            email_verified,
        }
    }

    /// Returns the user's display name, or email as fallback.
    pub fn display_name_or_email(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// "An account exists, verification incomplete" placeholder.
///
/// At most one pending email exists at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    email: Option<String>,
}

impl PendingVerification {
    /// No verification in progress.
    pub fn none() -> Self {
        Self { email: None }
    }

    /// Verification in progress for the given address.
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }

    /// The pending address, if any.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns true if a verification is in progress.
    pub fn is_pending(&self) -> bool {
        self.email.is_some()
    }
}

/// Classified authentication failures.
///
/// These are the kinds a flow renders inline. Raw service text is kept only
/// for the generic failure kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Sign-in rejected for bad email or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Sign-in blocked until the email is verified.
    #[error("Email not confirmed")]
    EmailNotConfirmed,

    /// Sign-up rejected because the email already has an account.
    #[error("Email already registered")]
    AlreadyRegistered,

    /// Service-side minimum password rule rejected the password.
    #[error("Password too weak")]
    WeakPassword,

    /// Local validation failed before any remote call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Too many incorrect one-time codes for the current code.
    #[error("One-time code attempts exhausted")]
    CodeAttemptsExhausted,

    /// The operation needs a signed-in identity.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Any other remote failure, network-level or service-rejected.
    #[error("Service failure: {0}")]
    NetworkOrServiceFailure(String),
}

impl AuthError {
    /// Creates a local validation failure.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Maps a raw service failure onto a classified kind.
    ///
    /// The machine-readable code wins when present; otherwise known message
    /// fragments are matched case-insensitively.
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        match code {
            Some("invalid_credentials") => return AuthError::InvalidCredentials,
            Some("email_not_confirmed") => return AuthError::EmailNotConfirmed,
            Some("user_already_exists") | Some("email_exists") => {
                return AuthError::AlreadyRegistered
            }
            Some("weak_password") => return AuthError::WeakPassword,
            _ => {}
        }

        let lowered = message.to_lowercase();
        if lowered.contains("invalid login credentials") {
            AuthError::InvalidCredentials
        } else if lowered.contains("email not confirmed") {
            AuthError::EmailNotConfirmed
        } else if lowered.contains("already registered") || lowered.contains("already exists") {
            AuthError::AlreadyRegistered
        } else if lowered.contains("password should be at least") {
            AuthError::WeakPassword
        } else {
            AuthError::NetworkOrServiceFailure(message.to_string())
        }
    }

    /// Text rendered in the flow's inline error region.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
            AuthError::EmailNotConfirmed => {
                "Please verify your email address before signing in.".to_string()
            }
            AuthError::AlreadyRegistered => {
                "An account with this email already exists. Try signing in instead.".to_string()
            }
            AuthError::WeakPassword => "Password must be at least 6 characters.".to_string(),
            AuthError::InvalidInput(message) => message.clone(),
            AuthError::CodeAttemptsExhausted => {
                "Too many incorrect codes. Request a new code to try again.".to_string()
            }
            AuthError::NotAuthenticated => "Please sign in to continue.".to_string(),
            AuthError::NetworkOrServiceFailure(_) => {
                "Something went wrong. Please check your connection and try again.".to_string()
            }
        }
    }

    /// Returns true if this failure was detected locally, before any remote call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidInput(_) | AuthError::CodeAttemptsExhausted
        )
    }
}
