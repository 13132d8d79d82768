//! REST collaborator - HTTP client for the hosted backend.
//!
//! Talks to the three surfaces the backend exposes under one base URL:
//! `/auth/v1` for accounts and sessions, `/rest/v1` for collections, and
//! `/storage/v1` for objects. Every request carries the anon key; requests
//! made while signed in carry the session's access token as bearer.
//!
//! # Configuration
//!
//! ```ignore
//! let config = RestCollaboratorConfig::new("https://project.example.co", anon_key)
//!     .with_bucket("media")
//!     .with_timeout(Duration::from_secs(15));
//!
//! let collaborator = RestCollaborator::new(config)?;
//! ```
//!
//! Token refresh is not performed; an expired session surfaces as a
//! rejected request and the user signs in again.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

use crate::config::CollaboratorConfig;
use crate::domain::foundation::{EmailAddress, Identity, Role, UserId};
use crate::domain::media::FileUpload;
use crate::ports::{
    AccountCreated, AuthGateway, FileStorage, GatewayError, NewAccount, OtpPurpose, RecordError,
    RecordFilter, RecordStore, SessionChange, SortOrder, StorageError, StoredFile,
};

const CHANGE_CAPACITY: usize = 64;

/// Configuration for the REST collaborator.
#[derive(Debug, Clone)]
pub struct RestCollaboratorConfig {
    /// Project base URL, without a trailing slash.
    pub base_url: String,
    anon_key: Secret<String>,
    /// Storage bucket for uploads.
    pub bucket: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl RestCollaboratorConfig {
    /// Creates a configuration with the default bucket and timeout.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: Secret::new(anon_key.into()),
            bucket: "media".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Builds the client configuration from the application config section.
    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            bucket: config.storage_bucket.clone(),
            timeout: config.request_timeout(),
        }
    }

    /// Sets the storage bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }
}

struct RestSession {
    access_token: Secret<String>,
}

/// HTTP implementation of the collaborator ports.
pub struct RestCollaborator {
    config: RestCollaboratorConfig,
    client: Client,
    session: RwLock<Option<RestSession>>,
    changes: broadcast::Sender<SessionChange>,
}

impl RestCollaborator {
    /// Creates a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new(config: RestCollaboratorConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Ok(Self {
            config,
            client,
            session: RwLock::new(None),
            changes,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url, path)
    }

    fn rest_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, collection)
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url, self.config.bucket, path
        )
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url, self.config.bucket, path
        )
    }

    /// Adds the anon key and the best available bearer token.
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let session = self.session.read().await;
        let bearer = session
            .as_ref()
            .map(|s| s.access_token.expose_secret().clone())
            .unwrap_or_else(|| self.config.anon_key().to_string());
        request
            .header("apikey", self.config.anon_key())
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = self
            .authorize(request)
            .await
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::network(format!(
                        "Request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    GatewayError::network(format!("Connection failed: {}", e))
                } else {
                    GatewayError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_error(status, &body))
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value, GatewayError> {
        let response = self.send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, "collaborator returned unparseable JSON");
            GatewayError::with_code("malformed_response", format!("Failed to parse response: {}", e))
        })
    }

    /// Stores a session from a token response and announces it.
    async fn adopt_session(&self, body: &Value) -> Result<Identity, GatewayError> {
        let wire: WireSession = serde_json::from_value(body.clone())
            .map_err(|e| GatewayError::with_code("malformed_response", e.to_string()))?;
        let identity = wire.user.into_identity()?;
        *self.session.write().await = Some(RestSession {
            access_token: Secret::new(wire.access_token),
        });
        let _ = self.changes.send(SessionChange::SignedIn(identity.clone()));
        Ok(identity)
    }
}

// ───────────────────────────────────────────────────────────────
// Wire types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    user_metadata: WireMetadata,
    #[serde(default)]
    identities: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl WireUser {
    fn into_identity(self) -> Result<Identity, GatewayError> {
        let id = UserId::new(self.id)
            .map_err(|e| GatewayError::with_code("malformed_response", e.to_string()))?;
        Ok(Identity::new(
            id,
            self.email.unwrap_or_default(),
            self.user_metadata.display_name.or(self.user_metadata.full_name),
            Role::from_metadata(self.user_metadata.role.as_deref()),
            self.email_confirmed_at.is_some(),
        ))
    }
}

fn parse_error(status: StatusCode, body: &str) -> GatewayError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let code = parsed
        .get("error_code")
        .and_then(Value::as_str)
        .or_else(|| parsed.get("code").and_then(Value::as_str))
        .map(str::to_string);
    let message = ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unexpected status {}: {}", status, body));
    GatewayError { code, message }
}

fn query_params(filter: &RecordFilter) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for (field, value) in &filter.equals {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.push((field.clone(), format!("eq.{}", rendered)));
    }
    if let Some((field, order)) = &filter.order_by {
        let direction = match order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{}.{}", field, direction)));
    }
    if let Some(limit) = filter.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn record_error(err: GatewayError) -> RecordError {
    match err.code.as_deref() {
        Some("network_error") => RecordError::Unavailable(err.message),
        Some("malformed_response") => RecordError::Malformed(err.message),
        _ => RecordError::Rejected(err.message),
    }
}

fn first_row(body: Value, collection: &str, id: &str) -> Result<Value, RecordError> {
    match body {
        Value::Array(rows) => rows.into_iter().next().ok_or_else(|| RecordError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }),
        Value::Object(_) => Ok(body),
        other => Err(RecordError::Malformed(format!("expected rows, got {}", other))),
    }
}

#[async_trait]
impl AuthGateway for RestCollaborator {
    async fn create_account(&self, account: &NewAccount) -> Result<AccountCreated, GatewayError> {
        let payload = json!({
            "email": account.email.as_str(),
            "password": account.password.expose_secret(),
            "data": {
                "display_name": account.display_name,
                "role": account.role.as_str(),
            },
        });
        let body = self
            .send_json(self.client.post(self.auth_url("signup")).json(&payload))
            .await?;

        if body.get("access_token").is_some() {
            let identity = self.adopt_session(&body).await?;
            return Ok(AccountCreated {
                identity: Some(identity),
                needs_email_confirmation: false,
                identities_empty: false,
            });
        }

        let user: WireUser = serde_json::from_value(body)
            .map_err(|e| GatewayError::with_code("malformed_response", e.to_string()))?;
        let identities_empty = matches!(&user.identities, Some(list) if list.is_empty());
        Ok(AccountCreated {
            identity: Some(user.into_identity()?),
            needs_email_confirmation: true,
            identities_empty,
        })
    }

    async fn sign_in(
        &self,
        email: &EmailAddress,
        password: &SecretString,
    ) -> Result<Identity, GatewayError> {
        let payload = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let body = self
            .send_json(
                self.client
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "password")])
                    .json(&payload),
            )
            .await?;
        self.adopt_session(&body).await
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        if self.session.read().await.is_none() {
            return Ok(());
        }
        let result = self.send(self.client.post(self.auth_url("logout"))).await;
        *self.session.write().await = None;
        let _ = self.changes.send(SessionChange::SignedOut);
        result.map(|_| ())
    }

    async fn get_session(&self) -> Result<Option<Identity>, GatewayError> {
        if self.session.read().await.is_none() {
            return Ok(None);
        }
        let body = self.send_json(self.client.get(self.auth_url("user"))).await?;
        let user: WireUser = serde_json::from_value(body)
            .map_err(|e| GatewayError::with_code("malformed_response", e.to_string()))?;
        Ok(Some(user.into_identity()?))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn send_one_time_code(
        &self,
        email: &EmailAddress,
        create_if_missing: bool,
    ) -> Result<(), GatewayError> {
        let payload = json!({ "email": email.as_str(), "create_user": create_if_missing });
        self.send(self.client.post(self.auth_url("otp")).json(&payload))
            .await
            .map(|_| ())
    }

    async fn verify_one_time_code(
        &self,
        email: &EmailAddress,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Identity>, GatewayError> {
        let payload = json!({
            "email": email.as_str(),
            "token": code.trim(),
            "type": purpose.as_str(),
        });
        let body = self
            .send_json(self.client.post(self.auth_url("verify")).json(&payload))
            .await?;
        if body.get("access_token").is_some() {
            return self.adopt_session(&body).await.map(Some);
        }
        Ok(None)
    }

    async fn resend_one_time_code(
        &self,
        email: &EmailAddress,
        purpose: OtpPurpose,
    ) -> Result<(), GatewayError> {
        if purpose == OtpPurpose::Recovery {
            return self.send_recovery_code(email).await;
        }
        let payload = json!({ "email": email.as_str(), "type": purpose.as_str() });
        self.send(self.client.post(self.auth_url("resend")).json(&payload))
            .await
            .map(|_| ())
    }

    async fn send_recovery_code(&self, email: &EmailAddress) -> Result<(), GatewayError> {
        let payload = json!({ "email": email.as_str() });
        self.send(self.client.post(self.auth_url("recover")).json(&payload))
            .await
            .map(|_| ())
    }

    async fn send_magic_link(&self, email: &EmailAddress) -> Result<(), GatewayError> {
        self.send_one_time_code(email, false).await
    }

    async fn update_credentials(&self, password: &SecretString) -> Result<(), GatewayError> {
        let payload = json!({ "password": password.expose_secret() });
        let body = self
            .send_json(self.client.put(self.auth_url("user")).json(&payload))
            .await?;
        let user: WireUser = serde_json::from_value(body)
            .map_err(|e| GatewayError::with_code("malformed_response", e.to_string()))?;
        let identity = user.into_identity()?;
        let _ = self.changes.send(SessionChange::UserUpdated(identity));
        Ok(())
    }
}

#[async_trait]
impl FileStorage for RestCollaborator {
    async fn upload(&self, path: &str, file: &FileUpload) -> Result<StoredFile, StorageError> {
        let path = path.trim_matches('/');
        if path.is_empty() || path.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        let request = self
            .client
            .post(self.object_url(path))
            .header("Content-Type", file.content_type.as_str())
            .header("x-upsert", "false")
            .body(file.bytes.clone());
        self.send(request).await.map_err(|err| match err.code.as_deref() {
            Some("network_error") => StorageError::Unavailable(err.message),
            _ => StorageError::Rejected(err.message),
        })?;

        Ok(StoredFile {
            path: path.to_string(),
            public_url: self.public_url(path),
        })
    }
}

#[async_trait]
impl RecordStore for RestCollaborator {
    async fn query(&self, collection: &str, filter: &RecordFilter) -> Result<Vec<Value>, RecordError> {
        let body = self
            .send_json(self.client.get(self.rest_url(collection)).query(&query_params(filter)))
            .await
            .map_err(record_error)?;
        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(RecordError::Malformed(format!("expected rows, got {}", other))),
        }
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<Value, RecordError> {
        if !record.is_object() {
            return Err(RecordError::Malformed("record must be a JSON object".to_string()));
        }
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let body = self
            .send_json(
                self.client
                    .post(self.rest_url(collection))
                    .header("Prefer", "return=representation")
                    .json(&record),
            )
            .await
            .map_err(record_error)?;
        first_row(body, collection, &id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, RecordError> {
        if !patch.is_object() {
            return Err(RecordError::Malformed("patch must be a JSON object".to_string()));
        }
        let body = self
            .send_json(
                self.client
                    .patch(self.rest_url(collection))
                    .query(&[("id", format!("eq.{}", id))])
                    .header("Prefer", "return=representation")
                    .json(&patch),
            )
            .await
            .map_err(record_error)?;
        first_row(body, collection, id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RecordError> {
        let body = self
            .send_json(
                self.client
                    .delete(self.rest_url(collection))
                    .query(&[("id", format!("eq.{}", id))])
                    .header("Prefer", "return=representation"),
            )
            .await
            .map_err(record_error)?;
        first_row(body, collection, id).map(|_| ())
    }
}
