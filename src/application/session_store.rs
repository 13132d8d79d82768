//! Session store - single source of truth for who is signed in.
//!
//! State lives in a `watch` channel so views can subscribe and re-render on
//! change. It is written from two directions: explicit operation results
//! (sign-in, sign-up, verification) and session-change notifications pushed
//! by the auth gateway. Both go through the same mutation path and are
//! applied in arrival order, so the last writer wins.
//!
//! Until the initial session lookup resolves the phase is `Unknown`, which
//! views must treat as "not yet known" rather than "signed out".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use secrecy::SecretString;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::lock;
use crate::config::OtpConfig;
use crate::domain::foundation::{AuthError, EmailAddress, Identity, PendingVerification, Role};
use crate::domain::otp::AttemptGuard;
use crate::ports::{AuthGateway, NewAccount, OtpPurpose, SessionChange, SessionSlot};

/// Shortest password the service accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const REDIRECT_KEY: &str = "redirect_after_login";

/// What is known about the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// The initial session lookup has not resolved.
    #[default]
    Unknown,
    Anonymous,
    Authenticated(Identity),
}

impl SessionPhase {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionPhase::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Returns true once the initial lookup has resolved.
    pub fn is_known(&self) -> bool {
        !matches!(self, SessionPhase::Unknown)
    }
}

/// Everything a view reads from the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub pending: PendingVerification,
}

impl SessionSnapshot {
    pub fn identity(&self) -> Option<&Identity> {
        self.phase.identity()
    }
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignUpOutcome {
    /// True when a code was sent and the account is not yet signed in.
    pub needs_verification: bool,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub identity: Identity,
    /// Where the user was headed before the sign-in detour, if anywhere.
    pub redirect_to: Option<String>,
}

/// Owns the current identity and pending verification.
///
/// Create with [`SessionStore::start`]; views get an `Arc` and read via
/// [`current_identity`](Self::current_identity) or [`watch`](Self::watch).
pub struct SessionStore {
    gateway: Arc<dyn AuthGateway>,
    slot: Arc<dyn SessionSlot>,
    otp: OtpConfig,
    state: watch::Sender<SessionSnapshot>,
    generation: AtomicU64,
    attempts: Mutex<AttemptGuard>,
    /// Account reported by sign-up while its address is unconfirmed.
    provisional: Mutex<Option<Identity>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionStore {
    /// Creates the store, subscribes to session changes, and starts the
    /// initial session lookup.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        gateway: Arc<dyn AuthGateway>,
        slot: Arc<dyn SessionSlot>,
        otp: OtpConfig,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let attempts = AttemptGuard::new(otp.max_failed_attempts);
        let store = Arc::new(Self {
            gateway,
            slot,
            otp,
            state,
            generation: AtomicU64::new(0),
            attempts: Mutex::new(attempts),
            provisional: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        });

        let changes = store.gateway.subscribe();
        let start_generation = store.generation.load(Ordering::SeqCst);
        let listener = tokio::spawn(Self::listen(Arc::downgrade(&store), changes));
        let init = tokio::spawn(Self::initialize(Arc::downgrade(&store), start_generation));
        lock(&store.tasks).extend([listener, init]);

        store
    }

    // ───────────────────────────────────────────────────────────────
    // Reads
    // ───────────────────────────────────────────────────────────────

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase.clone()
    }

    pub fn pending(&self) -> PendingVerification {
        self.state.borrow().pending.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Waits until the initial session lookup has resolved.
    pub async fn ready(&self) {
        let mut rx = self.state.subscribe();
        // The sender is owned by `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|snapshot| snapshot.phase.is_known()).await;
    }

    /// Incorrect code submissions against the current code.
    pub fn failed_attempts(&self) -> u32 {
        lock(&self.attempts).failures()
    }

    /// One-time code settings the store was started with.
    pub fn otp_config(&self) -> &OtpConfig {
        &self.otp
    }

    // ───────────────────────────────────────────────────────────────
    // Account operations
    // ───────────────────────────────────────────────────────────────

    /// Signs in with email and password.
    ///
    /// On success the stored redirect target, if any, is returned and
    /// cleared. An unconfirmed address becomes the pending verification so
    /// the user can continue with a code.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = parse_email(email)?;
        if password.is_empty() {
            return Err(AuthError::invalid_input("Password is required"));
        }
        let password = SecretString::new(password.to_string());

        match self.gateway.sign_in(&email, &password).await {
            Ok(identity) => {
                info!(user_id = %identity.id, "signed in");
                let signed_in = identity.clone();
                self.mutate(move |snapshot| {
                    snapshot.phase = SessionPhase::Authenticated(signed_in);
                    snapshot.pending = PendingVerification::none();
                });
                Ok(SignedIn {
                    identity,
                    redirect_to: self.take_redirect(),
                })
            }
            Err(err) => {
                let err = AuthError::from(err);
                warn!(email = %email, error = %err, "sign-in failed");
                if err == AuthError::EmailNotConfirmed {
                    self.set_pending(&email);
                }
                Err(err)
            }
        }
    }

    /// Creates an account.
    ///
    /// When the service requires confirmation, the address becomes the
    /// pending verification and no identity is set. An already-registered
    /// address is reported as `AlreadyRegistered` whether the service
    /// rejects it or answers with an identities-empty success.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        wants_host_role: bool,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = parse_email(email)?;
        check_password(password)?;
        let display_name = Some(display_name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let account = NewAccount {
            email: email.clone(),
            password: SecretString::new(password.to_string()),
            display_name,
            role: if wants_host_role { Role::Host } else { Role::Guest },
        };

        let created = self.gateway.create_account(&account).await.map_err(|err| {
            let err = AuthError::from(err);
            warn!(email = %email, error = %err, "sign-up failed");
            err
        })?;

        if created.identities_empty {
            warn!(email = %email, "sign-up answered with no identities; address already registered");
            return Err(AuthError::AlreadyRegistered);
        }

        if created.needs_email_confirmation {
            self.set_pending(&email);
            *lock(&self.provisional) = created.identity.map(|mut identity| {
                identity.email_verified = false;
                identity
            });
            info!(email = %email, "account created; verification code sent");
            return Ok(SignUpOutcome {
                needs_verification: true,
            });
        }

        let identity = match created.identity {
            Some(identity) => identity,
            None => self
                .gateway
                .get_session()
                .await
                .map_err(AuthError::from)?
                .ok_or_else(|| {
                    AuthError::NetworkOrServiceFailure(
                        "Account created but no session was returned".to_string(),
                    )
                })?,
        };
        info!(user_id = %identity.id, "account created and signed in");
        self.mutate(move |snapshot| {
            snapshot.phase = SessionPhase::Authenticated(identity);
            snapshot.pending = PendingVerification::none();
        });
        Ok(SignUpOutcome {
            needs_verification: false,
        })
    }

    /// Verifies the sign-up code sent to the pending address.
    ///
    /// Returns `Ok(false)` for a rejected code; pending verification and
    /// identity are left unchanged. Refused locally once the failed-attempt
    /// cap is reached.
    pub async fn verify_one_time_code(&self, code: &str) -> Result<bool, AuthError> {
        let verified = self.verify_pending(code, OtpPurpose::Signup, true).await?;
        Ok(verified.is_some())
    }

    /// Verifies a password-recovery code for the pending address.
    ///
    /// On success the account is signed in so the password can be set; the
    /// pending verification stays until the reset finishes.
    pub async fn verify_recovery_code(&self, code: &str) -> Result<bool, AuthError> {
        let verified = self.verify_pending(code, OtpPurpose::Recovery, false).await?;
        Ok(verified.is_some())
    }

    /// Issues a fresh code to the pending address.
    pub async fn resend_code(&self, purpose: OtpPurpose) -> Result<(), AuthError> {
        let email = self.pending_email()?;
        self.gateway
            .resend_one_time_code(&email, purpose)
            .await
            .map_err(|err| {
                let err = AuthError::from(err);
                warn!(email = %email, error = %err, "resend failed");
                err
            })?;
        lock(&self.attempts).reset();
        debug!(email = %email, purpose = purpose.as_str(), "code resent");
        Ok(())
    }

    /// Mails a passwordless sign-in code and makes `email` pending.
    pub async fn request_sign_in_code(&self, email: &str) -> Result<(), AuthError> {
        let email = parse_email(email)?;
        self.gateway
            .send_one_time_code(&email, false)
            .await
            .map_err(|err| {
                let err = AuthError::from(err);
                warn!(email = %email, error = %err, "sign-in code request failed");
                err
            })?;
        self.set_pending(&email);
        info!(email = %email, "sign-in code sent");
        Ok(())
    }

    /// Verifies a passwordless sign-in code for the pending address.
    ///
    /// Like [`sign_in`](Self::sign_in), success returns and clears the
    /// stored redirect target. `Ok(None)` means the code was rejected.
    pub async fn verify_sign_in_code(&self, code: &str) -> Result<Option<SignedIn>, AuthError> {
        let verified = self.verify_pending(code, OtpPurpose::Email, true).await?;
        Ok(verified.map(|identity| SignedIn {
            identity,
            redirect_to: self.take_redirect(),
        }))
    }

    /// Sends a sign-in link, the alternate channel to the code.
    pub async fn send_magic_link(&self, email: &str) -> Result<(), AuthError> {
        let email = parse_email(email)?;
        self.gateway.send_magic_link(&email).await.map_err(|err| {
            let err = AuthError::from(err);
            warn!(email = %email, error = %err, "magic link failed");
            err
        })?;
        info!(email = %email, "magic link sent");
        Ok(())
    }

    /// Sends a recovery code and makes `email` the pending verification.
    pub async fn begin_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = parse_email(email)?;
        self.gateway.send_recovery_code(&email).await.map_err(|err| {
            let err = AuthError::from(err);
            warn!(email = %email, error = %err, "password reset request failed");
            err
        })?;
        *lock(&self.provisional) = None;
        self.set_pending(&email);
        info!(email = %email, "recovery code sent");
        Ok(())
    }

    /// Sets a new password for the signed-in account.
    pub async fn update_password(&self, password: &str) -> Result<(), AuthError> {
        check_password(password)?;
        let identity = self.current_identity().ok_or(AuthError::NotAuthenticated)?;
        self.gateway
            .update_credentials(&SecretString::new(password.to_string()))
            .await
            .map_err(|err| {
                let err = AuthError::from(err);
                warn!(user_id = %identity.id, error = %err, "password update failed");
                err
            })?;
        info!(user_id = %identity.id, "password updated");
        Ok(())
    }

    /// Continues without confirming the address.
    ///
    /// The account from sign-up becomes the identity with
    /// `email_verified = false`, and the pending verification is cleared.
    pub async fn skip_verification(&self) -> Result<Identity, AuthError> {
        let email = self.pending_email()?;
        let identity = lock(&self.provisional)
            .take()
            .filter(|identity| identity.email.eq_ignore_ascii_case(email.as_str()))
            .ok_or_else(|| AuthError::invalid_input("No sign-up is awaiting verification"))?;

        info!(user_id = %identity.id, "verification skipped");
        let skipped = identity.clone();
        self.mutate(move |snapshot| {
            snapshot.phase = SessionPhase::Authenticated(skipped);
            snapshot.pending = PendingVerification::none();
        });
        Ok(identity)
    }

    /// Clears identity and pending verification.
    ///
    /// Safe to call when already signed out. A failed remote sign-out is
    /// logged and the local state is cleared anyway.
    pub async fn sign_out(&self) {
        if let Err(err) = self.gateway.sign_out().await {
            warn!(error = %err, "remote sign-out failed; clearing local session");
        }
        *lock(&self.provisional) = None;
        lock(&self.attempts).reset();
        self.mutate(|snapshot| {
            snapshot.phase = SessionPhase::Anonymous;
            snapshot.pending = PendingVerification::none();
        });
        info!("signed out");
    }

    /// Drops the pending verification, if any.
    pub fn clear_pending(&self) {
        if self.state.borrow().pending.is_pending() {
            self.mutate(|snapshot| snapshot.pending = PendingVerification::none());
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Redirect slot
    // ───────────────────────────────────────────────────────────────

    /// Remembers where to go after the sign-in detour.
    pub fn remember_redirect(&self, target: &str) {
        self.slot.set(REDIRECT_KEY, target.to_string());
    }

    /// Reads and clears the remembered target.
    pub fn take_redirect(&self) -> Option<String> {
        self.slot.take(REDIRECT_KEY)
    }

    /// Stops listening for session changes.
    ///
    /// An initial lookup still in flight is abandoned and the phase resolves
    /// to `Anonymous`, so [`ready`](Self::ready) never hangs.
    pub fn shutdown(&self) {
        self.state.send_if_modified(|snapshot| {
            if snapshot.phase.is_known() {
                return false;
            }
            snapshot.phase = SessionPhase::Anonymous;
            true
        });
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Private helpers
    // ───────────────────────────────────────────────────────────────

    fn mutate(&self, apply: impl FnOnce(&mut SessionSnapshot)) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(apply);
    }

    /// Makes `email` the pending verification with a fresh attempt count.
    ///
    /// A provisional account for a different address is dropped.
    fn set_pending(&self, email: &EmailAddress) {
        lock(&self.attempts).reset();
        {
            let mut provisional = lock(&self.provisional);
            if provisional
                .as_ref()
                .is_some_and(|identity| !identity.email.eq_ignore_ascii_case(email.as_str()))
            {
                *provisional = None;
            }
        }
        let pending = email.as_str().to_string();
        self.mutate(move |snapshot| {
            snapshot.pending = PendingVerification::for_email(pending);
        });
    }

    fn pending_email(&self) -> Result<EmailAddress, AuthError> {
        let pending = self.state.borrow().pending.email().map(str::to_string);
        let email = pending.ok_or_else(|| AuthError::invalid_input("No verification in progress"))?;
        parse_email(&email)
    }

    async fn verify_pending(
        &self,
        code: &str,
        purpose: OtpPurpose,
        clears_pending: bool,
    ) -> Result<Option<Identity>, AuthError> {
        let email = self.pending_email()?;
        let code = code.trim();
        if code.len() != self.otp.code_length || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::invalid_input(format!(
                "Enter the {}-digit code",
                self.otp.code_length
            )));
        }
        if lock(&self.attempts).is_exhausted() {
            warn!(email = %email, "code submission refused; attempt cap reached");
            return Err(AuthError::CodeAttemptsExhausted);
        }

        let verified = match self.gateway.verify_one_time_code(&email, code, purpose).await {
            Ok(Some(identity)) => Some(identity),
            Ok(None) => self.gateway.get_session().await.ok().flatten(),
            Err(err) if err.code.as_deref() == Some("network_error") => {
                let err = AuthError::from(err);
                warn!(email = %email, error = %err, "code verification unreachable");
                return Err(err);
            }
            Err(err) => {
                let failures = {
                    let mut attempts = lock(&self.attempts);
                    attempts.record_failure();
                    attempts.failures()
                };
                warn!(email = %email, failures, error = %err, "code rejected");
                return Ok(None);
            }
        };

        let Some(identity) = verified else {
            warn!(email = %email, "code accepted but no session was returned");
            return Ok(None);
        };

        lock(&self.attempts).reset();
        *lock(&self.provisional) = None;
        info!(user_id = %identity.id, purpose = purpose.as_str(), "code verified");
        let verified = identity.clone();
        self.mutate(move |snapshot| {
            snapshot.phase = SessionPhase::Authenticated(verified);
            if clears_pending {
                snapshot.pending = PendingVerification::none();
            }
        });
        Ok(Some(identity))
    }

    fn apply_change(&self, change: SessionChange) {
        debug!(kind = change.kind(), "session change received");
        match change {
            SessionChange::SignedIn(identity)
            | SessionChange::TokenRefreshed(identity)
            | SessionChange::UserUpdated(identity) => {
                self.mutate(move |snapshot| {
                    snapshot.phase = SessionPhase::Authenticated(identity);
                });
            }
            SessionChange::SignedOut => {
                *lock(&self.provisional) = None;
                self.mutate(|snapshot| {
                    snapshot.phase = SessionPhase::Anonymous;
                    snapshot.pending = PendingVerification::none();
                });
            }
        }
    }

    async fn listen(store: Weak<Self>, mut changes: broadcast::Receiver<SessionChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => match store.upgrade() {
                    Some(store) => store.apply_change(change),
                    None => break,
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session change notifications dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn initialize(store: Weak<Self>, start_generation: u64) {
        let Some(store) = store.upgrade() else {
            return;
        };
        let restored = match store.gateway.get_session().await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "initial session lookup failed");
                None
            }
        };

        let generation = &store.generation;
        store.state.send_modify(|snapshot| {
            if generation.load(Ordering::SeqCst) == start_generation {
                snapshot.phase = match restored {
                    Some(identity) => SessionPhase::Authenticated(identity),
                    None => SessionPhase::Anonymous,
                };
            } else if !snapshot.phase.is_known() {
                snapshot.phase = SessionPhase::Anonymous;
            }
        });
        debug!(phase = ?store.phase(), "session initialized");
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("snapshot", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn parse_email(raw: &str) -> Result<EmailAddress, AuthError> {
    EmailAddress::parse(raw).map_err(|err| AuthError::invalid_input(err.user_message()))
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::invalid_input(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
