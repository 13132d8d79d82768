//! In-memory collaborator for tests and local development.
//!
//! Behaves like the hosted backend closely enough to drive every flow:
//! accounts with hashed passwords, one-time codes stored as digests and
//! compared in constant time, a session with change notifications, object
//! storage, and JSON collections.
//!
//! Test hooks:
//! - `force_error` makes an operation fail until `clear_error`
//! - `call_count` reports how often an operation was invoked
//! - `hold_responses` parks every call after it is counted until
//!   `release_responses`, for in-flight tests
//! - `mailbox` / `issued_code` expose outgoing mail
//!
//! # Example
//!
//! ```ignore
//! let collaborator = InMemoryCollaborator::new().with_email_confirmation(true);
//! let store = SessionStore::start(Arc::new(collaborator.clone()), slot, otp);
//! store.sign_up("ada@example.com", "secret1", "Ada", false).await?;
//! let code = collaborator.issued_code("ada@example.com").unwrap();
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::domain::foundation::{EmailAddress, Identity, Role, UserId};
use crate::domain::media::FileUpload;
use crate::ports::{
    AccountCreated, AuthGateway, FileStorage, GatewayError, NewAccount, OtpPurpose, RecordError,
    RecordFilter, RecordStore, SessionChange, SortOrder, StorageError, StoredFile,
};

const CHANGE_CAPACITY: usize = 64;
const PUBLIC_URL_BASE: &str = "https://storage.local";

/// Collaborator operations, for call counting and forced failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAccount,
    SignIn,
    SignOut,
    GetSession,
    SendOneTimeCode,
    VerifyOneTimeCode,
    ResendOneTimeCode,
    SendRecoveryCode,
    SendMagicLink,
    UpdateCredentials,
    Upload,
    Query,
    Insert,
    Update,
    Delete,
}

/// Kind of outgoing mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentMailKind {
    Code(OtpPurpose),
    MagicLink,
}

/// A message the collaborator "sent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub kind: SentMailKind,
    /// The code or link token in the message body.
    pub secret: String,
}

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: String,
    password_digest: [u8; 32],
    display_name: Option<String>,
    role: Role,
    email_verified: bool,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity::new(
            self.id.clone(),
            self.email.clone(),
            self.display_name.clone(),
            self.role,
            self.email_verified,
        )
    }
}

#[derive(Debug, Clone)]
struct IssuedCode {
    digest: [u8; 32],
    purpose: OtpPurpose,
}

#[derive(Debug, Default)]
struct CollaboratorState {
    accounts: HashMap<String, Account>,
    codes: HashMap<String, IssuedCode>,
    session: Option<String>,
    mail: Vec<SentMail>,
    objects: HashMap<String, usize>,
    collections: HashMap<String, Vec<Value>>,
    calls: HashMap<Operation, usize>,
    forced: HashMap<Operation, GatewayError>,
    require_confirmation: bool,
}

/// Deterministic stand-in for the hosted backend.
///
/// Cloning shares state, so a test can keep a handle while the session
/// store owns another.
#[derive(Clone)]
pub struct InMemoryCollaborator {
    state: Arc<Mutex<CollaboratorState>>,
    changes: broadcast::Sender<SessionChange>,
    held: Arc<watch::Sender<bool>>,
}

impl Default for InMemoryCollaborator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryCollaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCollaborator").finish_non_exhaustive()
    }
}

impl InMemoryCollaborator {
    /// Creates an empty collaborator with email confirmation disabled.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        let (held, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(CollaboratorState::default())),
            changes,
            held: Arc::new(held),
        }
    }

    /// Requires new accounts to confirm their address with a code.
    pub fn with_email_confirmation(self, required: bool) -> Self {
        self.lock().require_confirmation = required;
        self
    }

    /// Seeds a confirmed account.
    pub fn with_account(
        self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> Self {
        let email = email.trim().to_lowercase();
        let account = Account {
            id: UserId::generate(),
            email: email.clone(),
            password_digest: digest(password),
            display_name: display_name.map(str::to_string),
            role,
            email_verified: true,
        };
        self.lock().accounts.insert(email, account);
        self
    }

    /// Seeds an existing session for `email`, as if restored from storage.
    pub fn with_session(self, email: &str) -> Self {
        self.lock().session = Some(email.trim().to_lowercase());
        self
    }

    // ───────────────────────────────────────────────────────────────
    // Test hooks
    // ───────────────────────────────────────────────────────────────

    /// Makes `operation` fail with `error` until cleared.
    pub fn force_error(&self, operation: Operation, error: GatewayError) {
        self.lock().forced.insert(operation, error);
    }

    /// Clears a forced failure.
    pub fn clear_error(&self, operation: Operation) {
        self.lock().forced.remove(&operation);
    }

    /// Number of times `operation` has been invoked.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Parks every subsequent call after it is counted.
    pub fn hold_responses(&self) {
        self.held.send_replace(true);
    }

    /// Lets parked and future calls proceed.
    pub fn release_responses(&self) {
        self.held.send_replace(false);
    }

    /// Pushes a session change as if it came from another tab.
    pub fn push_change(&self, change: SessionChange) {
        if let SessionChange::SignedOut = change {
            self.lock().session = None;
        }
        let _ = self.changes.send(change);
    }

    /// Every message sent to `email`, oldest first.
    pub fn mailbox(&self, email: &str) -> Vec<SentMail> {
        let email = email.trim().to_lowercase();
        self.lock()
            .mail
            .iter()
            .filter(|mail| mail.to == email)
            .cloned()
            .collect()
    }

    /// The most recent code mailed to `email`.
    pub fn issued_code(&self, email: &str) -> Option<String> {
        self.mailbox(email)
            .into_iter()
            .rev()
            .find(|mail| matches!(mail.kind, SentMailKind::Code(_)))
            .map(|mail| mail.secret)
    }

    /// Returns true if an account exists for `email`.
    pub fn has_account(&self, email: &str) -> bool {
        self.lock().accounts.contains_key(&email.trim().to_lowercase())
    }

    /// Returns true if `email` is confirmed.
    pub fn is_verified(&self, email: &str) -> bool {
        self.lock()
            .accounts
            .get(&email.trim().to_lowercase())
            .map(|account| account.email_verified)
            .unwrap_or(false)
    }

    /// Returns true if `password` is the current password of `email`.
    pub fn password_matches(&self, email: &str, password: &str) -> bool {
        self.lock()
            .accounts
            .get(&email.trim().to_lowercase())
            .map(|account| bool::from(account.password_digest.ct_eq(&digest(password))))
            .unwrap_or(false)
    }

    /// Paths of every stored object.
    pub fn stored_objects(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Raw rows of a collection.
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    // ───────────────────────────────────────────────────────────────
    // Private helpers
    // ───────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, CollaboratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts the call, waits while held, then applies any forced failure.
    async fn enter(&self, operation: Operation) -> Result<(), GatewayError> {
        *self.lock().calls.entry(operation).or_insert(0) += 1;

        let mut held = self.held.subscribe();
        // The sender lives as long as `self`, so this only errors on teardown.
        let _ = held.wait_for(|is_held| !*is_held).await;

        match self.lock().forced.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn notify(&self, change: SessionChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    fn issue_code(state: &mut CollaboratorState, email: &str, purpose: OtpPurpose) {
        let code = format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000);
        state.codes.insert(
            email.to_string(),
            IssuedCode {
                digest: digest(&code),
                purpose,
            },
        );
        state.mail.push(SentMail {
            to: email.to_string(),
            kind: SentMailKind::Code(purpose),
            secret: code,
        });
    }

    fn current_account(state: &CollaboratorState) -> Option<&Account> {
        state
            .session
            .as_ref()
            .and_then(|email| state.accounts.get(email))
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn compare_field(a: &Value, b: &Value, field: &str) -> std::cmp::Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        _ => std::cmp::Ordering::Equal,
    }
}

#[async_trait]
impl AuthGateway for InMemoryCollaborator {
    async fn create_account(&self, account: &NewAccount) -> Result<AccountCreated, GatewayError> {
        self.enter(Operation::CreateAccount).await?;
        let email = account.email.as_str().to_string();

        let mut state = self.lock();
        if state.accounts.contains_key(&email) {
            if state.require_confirmation {
                // Reported as a success without identities so registered
                // addresses stay indistinguishable.
                return Ok(AccountCreated {
                    identity: None,
                    needs_email_confirmation: true,
                    identities_empty: true,
                });
            }
            return Err(GatewayError::with_code(
                "user_already_exists",
                "User already registered",
            ));
        }

        let needs_confirmation = state.require_confirmation;
        let created = Account {
            id: UserId::generate(),
            email: email.clone(),
            password_digest: digest(account.password.expose_secret()),
            display_name: account.display_name.clone(),
            role: account.role,
            email_verified: !needs_confirmation,
        };
        let identity = created.identity();
        state.accounts.insert(email.clone(), created);

        if needs_confirmation {
            Self::issue_code(&mut state, &email, OtpPurpose::Signup);
        } else {
            state.session = Some(email);
        }
        drop(state);

        if !needs_confirmation {
            self.notify(SessionChange::SignedIn(identity.clone()));
        }
        Ok(AccountCreated {
            identity: Some(identity),
            needs_email_confirmation: needs_confirmation,
            identities_empty: false,
        })
    }

    async fn sign_in(
        &self,
        email: &EmailAddress,
        password: &SecretString,
    ) -> Result<Identity, GatewayError> {
        self.enter(Operation::SignIn).await?;

        let mut state = self.lock();
        let invalid = || GatewayError::with_code("invalid_credentials", "Invalid login credentials");
        let account = state.accounts.get(email.as_str()).ok_or_else(invalid)?;
        let matches: bool = account
            .password_digest
            .ct_eq(&digest(password.expose_secret()))
            .into();
        if !matches {
            return Err(invalid());
        }
        if !account.email_verified && state.require_confirmation {
            return Err(GatewayError::with_code(
                "email_not_confirmed",
                "Email not confirmed",
            ));
        }
        let identity = account.identity();
        state.session = Some(email.as_str().to_string());
        drop(state);

        self.notify(SessionChange::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.enter(Operation::SignOut).await?;
        let had_session = self.lock().session.take().is_some();
        if had_session {
            self.notify(SessionChange::SignedOut);
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Identity>, GatewayError> {
        self.enter(Operation::GetSession).await?;
        let state = self.lock();
        Ok(Self::current_account(&state).map(Account::identity))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn send_one_time_code(
        &self,
        email: &EmailAddress,
        create_if_missing: bool,
    ) -> Result<(), GatewayError> {
        self.enter(Operation::SendOneTimeCode).await?;
        let email = email.as_str().to_string();

        let mut state = self.lock();
        if !state.accounts.contains_key(&email) {
            if !create_if_missing {
                return Err(GatewayError::with_code(
                    "otp_disabled",
                    "Signups not allowed for otp",
                ));
            }
            let account = Account {
                id: UserId::generate(),
                email: email.clone(),
                password_digest: digest(&Uuid::new_v4().to_string()),
                display_name: None,
                role: Role::Guest,
                email_verified: false,
            };
            state.accounts.insert(email.clone(), account);
        }
        Self::issue_code(&mut state, &email, OtpPurpose::Email);
        Ok(())
    }

    async fn verify_one_time_code(
        &self,
        email: &EmailAddress,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Identity>, GatewayError> {
        self.enter(Operation::VerifyOneTimeCode).await?;
        let email = email.as_str().to_string();

        let mut state = self.lock();
        let rejected = || GatewayError::with_code("otp_expired", "Token has expired or is invalid");
        let issued = state.codes.get(&email).ok_or_else(rejected)?;
        let code_matches: bool = issued.digest.ct_eq(&digest(code.trim())).into();
        if !code_matches || issued.purpose != purpose {
            return Err(rejected());
        }
        state.codes.remove(&email);

        let account = state.accounts.get_mut(&email).ok_or_else(rejected)?;
        account.email_verified = true;
        let identity = account.identity();
        state.session = Some(email);
        drop(state);

        self.notify(SessionChange::SignedIn(identity.clone()));
        Ok(Some(identity))
    }

    async fn resend_one_time_code(
        &self,
        email: &EmailAddress,
        purpose: OtpPurpose,
    ) -> Result<(), GatewayError> {
        self.enter(Operation::ResendOneTimeCode).await?;
        let email = email.as_str().to_string();

        let mut state = self.lock();
        let verified = state.accounts.get(&email).map(|account| account.email_verified);
        match verified {
            Some(true) if purpose == OtpPurpose::Signup => Err(GatewayError::with_code(
                "email_already_confirmed",
                "Email already confirmed",
            )),
            Some(_) => {
                Self::issue_code(&mut state, &email, purpose);
                Ok(())
            }
            None => Err(GatewayError::with_code("user_not_found", "User not found")),
        }
    }

    async fn send_recovery_code(&self, email: &EmailAddress) -> Result<(), GatewayError> {
        self.enter(Operation::SendRecoveryCode).await?;
        let email = email.as_str().to_string();

        let mut state = self.lock();
        if state.accounts.contains_key(&email) {
            Self::issue_code(&mut state, &email, OtpPurpose::Recovery);
        }
        Ok(())
    }

    async fn send_magic_link(&self, email: &EmailAddress) -> Result<(), GatewayError> {
        self.enter(Operation::SendMagicLink).await?;
        let email = email.as_str().to_string();

        let mut state = self.lock();
        if !state.accounts.contains_key(&email) {
            return Err(GatewayError::with_code(
                "otp_disabled",
                "Signups not allowed for otp",
            ));
        }
        state.mail.push(SentMail {
            to: email,
            kind: SentMailKind::MagicLink,
            secret: Uuid::new_v4().simple().to_string(),
        });
        Ok(())
    }

    async fn update_credentials(&self, password: &SecretString) -> Result<(), GatewayError> {
        self.enter(Operation::UpdateCredentials).await?;

        let mut state = self.lock();
        let email = state
            .session
            .clone()
            .ok_or_else(|| GatewayError::with_code("session_not_found", "Auth session missing!"))?;
        let account = state
            .accounts
            .get_mut(&email)
            .ok_or_else(|| GatewayError::with_code("user_not_found", "User not found"))?;
        account.password_digest = digest(password.expose_secret());
        let identity = account.identity();
        drop(state);

        self.notify(SessionChange::UserUpdated(identity));
        Ok(())
    }
}

#[async_trait]
impl FileStorage for InMemoryCollaborator {
    async fn upload(&self, path: &str, file: &FileUpload) -> Result<StoredFile, StorageError> {
        self.enter(Operation::Upload)
            .await
            .map_err(|err| StorageError::Rejected(err.message))?;

        let path = path.trim_matches('/');
        if path.is_empty() || path.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        let mut state = self.lock();
        if state.objects.contains_key(path) {
            return Err(StorageError::Rejected(format!("{} already exists", path)));
        }
        state.objects.insert(path.to_string(), file.bytes.len());
        Ok(StoredFile {
            path: path.to_string(),
            public_url: format!("{}/{}", PUBLIC_URL_BASE, path),
        })
    }
}

#[async_trait]
impl RecordStore for InMemoryCollaborator {
    async fn query(&self, collection: &str, filter: &RecordFilter) -> Result<Vec<Value>, RecordError> {
        self.enter(Operation::Query)
            .await
            .map_err(|err| RecordError::Unavailable(err.message))?;

        let state = self.lock();
        let mut rows: Vec<Value> = state
            .collections
            .get(collection)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default();
        drop(state);

        if let Some((field, order)) = &filter.order_by {
            rows.sort_by(|a, b| {
                let ordering = compare_field(a, b, field);
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<Value, RecordError> {
        self.enter(Operation::Insert)
            .await
            .map_err(|err| RecordError::Rejected(err.message))?;

        let Value::Object(mut fields) = record else {
            return Err(RecordError::Malformed("record must be a JSON object".to_string()));
        };
        let id = match fields.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                fields.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let mut state = self.lock();
        let rows = state.collections.entry(collection.to_string()).or_default();
        if rows.iter().any(|row| record_id(row) == Some(id.as_str())) {
            return Err(RecordError::Rejected(format!(
                "duplicate key value violates unique constraint: id={}",
                id
            )));
        }
        let stored = Value::Object(fields);
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, RecordError> {
        self.enter(Operation::Update)
            .await
            .map_err(|err| RecordError::Rejected(err.message))?;

        let Value::Object(patch) = patch else {
            return Err(RecordError::Malformed("patch must be a JSON object".to_string()));
        };
        let not_found = || RecordError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        };

        let mut state = self.lock();
        let row = state
            .collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|row| record_id(row) == Some(id)))
            .ok_or_else(not_found)?;
        let fields: &mut Map<String, Value> = row
            .as_object_mut()
            .ok_or_else(|| RecordError::Malformed(format!("row {} is not an object", id)))?;
        for (key, value) in patch {
            if key != "id" {
                fields.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RecordError> {
        self.enter(Operation::Delete)
            .await
            .map_err(|err| RecordError::Rejected(err.message))?;

        let mut state = self.lock();
        let rows = state.collections.get_mut(collection);
        let removed = rows
            .map(|rows| {
                let before = rows.len();
                rows.retain(|row| record_id(row) != Some(id));
                before != rows.len()
            })
            .unwrap_or(false);
        if removed {
            Ok(())
        } else {
            Err(RecordError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::parse(raw).unwrap()
    }

    fn new_account(raw: &str) -> NewAccount {
        NewAccount {
            email: email(raw),
            password: SecretString::new("secret-1".to_string()),
            display_name: Some("Ada".to_string()),
            role: Role::Guest,
        }
    }

    #[tokio::test]
    async fn create_account_with_confirmation_mails_a_code() {
        let collaborator = InMemoryCollaborator::new().with_email_confirmation(true);
        let created = collaborator.create_account(&new_account("ada@example.com")).await.unwrap();

        assert!(created.needs_email_confirmation);
        assert!(!created.identities_empty);
        let code = collaborator.issued_code("ada@example.com").unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn duplicate_signup_reports_empty_identities_when_confirming() {
        let collaborator = InMemoryCollaborator::new()
            .with_email_confirmation(true)
            .with_account("ada@example.com", "secret-1", None, Role::Guest);
        let created = collaborator.create_account(&new_account("ada@example.com")).await.unwrap();
        assert!(created.identities_empty);
        assert!(created.identity.is_none());
    }

    #[tokio::test]
    async fn duplicate_signup_errors_without_confirmation() {
        let collaborator =
            InMemoryCollaborator::new().with_account("ada@example.com", "secret-1", None, Role::Guest);
        let err = collaborator.create_account(&new_account("ada@example.com")).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("user_already_exists"));
    }

    #[tokio::test]
    async fn verify_accepts_only_the_issued_code() {
        let collaborator = InMemoryCollaborator::new().with_email_confirmation(true);
        collaborator.create_account(&new_account("ada@example.com")).await.unwrap();
        let code = collaborator.issued_code("ada@example.com").unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert!(collaborator
            .verify_one_time_code(&email("ada@example.com"), wrong, OtpPurpose::Signup)
            .await
            .is_err());
        let identity = collaborator
            .verify_one_time_code(&email("ada@example.com"), &code, OtpPurpose::Signup)
            .await
            .unwrap()
            .unwrap();
        assert!(identity.email_verified);
        assert!(collaborator.is_verified("ada@example.com"));
    }

    #[tokio::test]
    async fn verify_rejects_code_of_another_purpose() {
        let collaborator =
            InMemoryCollaborator::new().with_account("ada@example.com", "secret-1", None, Role::Guest);
        collaborator.send_recovery_code(&email("ada@example.com")).await.unwrap();
        let code = collaborator.issued_code("ada@example.com").unwrap();
        assert!(collaborator
            .verify_one_time_code(&email("ada@example.com"), &code, OtpPurpose::Signup)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn sign_in_checks_password_and_notifies() {
        let collaborator =
            InMemoryCollaborator::new().with_account("ada@example.com", "secret-1", None, Role::Host);
        let mut changes = collaborator.subscribe();

        let bad = SecretString::new("nope".to_string());
        let err = collaborator.sign_in(&email("ada@example.com"), &bad).await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("invalid_credentials"));

        let good = SecretString::new("secret-1".to_string());
        let identity = collaborator.sign_in(&email("ada@example.com"), &good).await.unwrap();
        assert_eq!(identity.role, Role::Host);
        assert_eq!(changes.recv().await.unwrap(), SessionChange::SignedIn(identity));
    }

    #[tokio::test]
    async fn recovery_for_unknown_address_is_silent() {
        let collaborator = InMemoryCollaborator::new();
        collaborator.send_recovery_code(&email("ghost@example.com")).await.unwrap();
        assert!(collaborator.mailbox("ghost@example.com").is_empty());
    }

    #[tokio::test]
    async fn forced_errors_apply_until_cleared() {
        let collaborator = InMemoryCollaborator::new();
        collaborator.force_error(Operation::GetSession, GatewayError::network("offline"));
        assert!(collaborator.get_session().await.is_err());
        collaborator.clear_error(Operation::GetSession);
        assert_eq!(collaborator.get_session().await.unwrap(), None);
        assert_eq!(collaborator.call_count(Operation::GetSession), 2);
    }

    #[tokio::test]
    async fn held_calls_are_counted_before_they_resolve() {
        let collaborator = InMemoryCollaborator::new();
        collaborator.hold_responses();

        let pending = {
            let collaborator = collaborator.clone();
            tokio::spawn(async move { collaborator.get_session().await })
        };
        while collaborator.call_count(Operation::GetSession) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!pending.is_finished());

        collaborator.release_responses();
        assert_eq!(pending.await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn records_support_filter_order_and_limit() {
        let collaborator = InMemoryCollaborator::new();
        for (id, status, price) in [("a", "published", 3), ("b", "draft", 1), ("c", "published", 2)] {
            collaborator
                .insert("tours", json!({"id": id, "status": status, "price": price}))
                .await
                .unwrap();
        }
        let filter = RecordFilter::all()
            .eq("status", "published")
            .order_by("price", SortOrder::Ascending)
            .limit(5);
        let rows = collaborator.query("tours", &filter).await.unwrap();
        let ids: Vec<&str> = rows.iter().filter_map(record_id).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn update_merges_and_delete_removes() {
        let collaborator = InMemoryCollaborator::new();
        collaborator.insert("bookings", json!({"id": "b1", "status": "confirmed"})).await.unwrap();

        let row = collaborator
            .update("bookings", "b1", json!({"status": "cancelled", "id": "other"}))
            .await
            .unwrap();
        assert_eq!(row, json!({"id": "b1", "status": "cancelled"}));

        collaborator.delete("bookings", "b1").await.unwrap();
        assert!(matches!(
            collaborator.delete("bookings", "b1").await,
            Err(RecordError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn insert_generates_missing_ids_and_rejects_duplicates() {
        let collaborator = InMemoryCollaborator::new();
        let row = collaborator.insert("tours", json!({"title": "x"})).await.unwrap();
        let id = record_id(&row).unwrap().to_string();
        assert!(collaborator.insert("tours", json!({"id": id})).await.is_err());
        assert!(collaborator.insert("tours", json!([1, 2])).await.is_err());
    }

    #[tokio::test]
    async fn upload_returns_public_url() {
        let collaborator = InMemoryCollaborator::new();
        let file = FileUpload::new("a.jpg", "image/jpeg", vec![1, 2, 3]);
        let stored = collaborator.upload("tours/t1/images/a.jpg", &file).await.unwrap();
        assert_eq!(stored.public_url, "https://storage.local/tours/t1/images/a.jpg");
        assert!(collaborator.upload("../etc", &file).await.is_err());
    }
}
