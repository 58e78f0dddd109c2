//! Marketplace REST API client.
//!
//! # Architecture
//!
//! - Thin typed wrapper over `reqwest`; the remote API is the source of truth
//! - The bearer credential lives in a shared slot that the session manager
//!   fills on login and empties on logout. Every request reads the slot when
//!   it is built, so once `clear_token` returns no later request carries the
//!   old token.
//! - Every request carries the per-installation id as `X-Session-Id`
//!
//! # Endpoints
//!
//! ```text
//! POST   /auth/login
//! POST   /auth/register
//! GET    /auth/me
//! GET    /notifications?limit=N
//! GET    /notifications/unread-count
//! PATCH  /notifications/:id/read
//! PATCH  /notifications/mark-all-read
//! DELETE /notifications/:id
//! DELETE /notifications/all
//! ```

pub mod types;

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use marketplace_core::NotificationId;

use crate::config::ClientConfig;
use crate::models::User;

pub use types::{
    Ack, AuthEnvelope, AuthGrant, LoginRequest, NotificationList, RegisterRequest, UnreadCount,
};
use types::ErrorBody;

/// Header carrying the per-installation identifier.
pub const SESSION_ID_HEADER: &str = "X-Session-Id";

/// Errors that can occur when talking to the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, if any.
        message: Option<String>,
    },

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// A successful response was missing a required field.
    #[error("Malformed response: missing {0}")]
    Malformed(&'static str),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the server refused the credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }

    /// Message supplied by the server, if there was one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            Self::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

/// Client for the marketplace REST API.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the
/// credential slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base: Url,
    installation_id: String,
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .field("installation_id", &self.inner.installation_id)
            .field("has_token", &self.has_token())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, installation_id: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("marketplace-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base: config.api_url.clone(),
                installation_id: installation_id.into(),
                token: RwLock::new(None),
            }),
        })
    }

    // =========================================================================
    // Credential
    // =========================================================================

    /// Attach `token` as the bearer credential for all subsequent requests.
    pub fn set_token(&self, token: &str) {
        let mut slot = self.inner.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(SecretString::from(token.to_owned()));
    }

    /// Detach the bearer credential.
    pub fn clear_token(&self) {
        let mut slot = self.inner.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Whether a credential is currently attached.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The per-installation identifier sent with every request.
    #[must_use]
    pub fn installation_id(&self) -> &str {
        &self.inner.installation_id
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` or `ApiError::Status` with the server's
    /// message when the credentials are refused.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError> {
        let envelope: AuthEnvelope = self
            .send(
                Method::POST,
                self.endpoint(&["auth", "login"])?,
                Some(&LoginRequest { email, password }),
            )
            .await?;
        into_grant(envelope)
    }

    /// Create an account; the response doubles as a login.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` or `ApiError::Status` with the server's
    /// message when registration is refused.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<AuthGrant, ApiError> {
        let envelope: AuthEnvelope = self
            .send(Method::POST, self.endpoint(&["auth", "register"])?, Some(request))
            .await?;
        into_grant(envelope)
    }

    /// Fetch the profile of the user owning the attached credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is refused or the response has no user.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let envelope: AuthEnvelope = self
            .send(Method::GET, self.endpoint(&["auth", "me"])?, None::<&()>)
            .await?;
        if !envelope.success {
            return Err(rejected(envelope.message));
        }
        envelope.user.ok_or(ApiError::Malformed("user"))
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Fetch up to `limit` most recent notifications plus the unread total.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn list_notifications(&self, limit: u32) -> Result<NotificationList, ApiError> {
        let mut url = self.endpoint(&["notifications"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let list: NotificationList = self.send(Method::GET, url, None::<&()>).await?;
        if !list.success {
            return Err(rejected(list.message));
        }
        Ok(list)
    }

    /// Fetch only the unread total.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let count: UnreadCount = self
            .send(
                Method::GET,
                self.endpoint(&["notifications", "unread-count"])?,
                None::<&()>,
            )
            .await?;
        if !count.success {
            return Err(rejected(count.message));
        }
        Ok(count.count)
    }

    /// Mark one notification as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self, id), fields(notification_id = %id))]
    pub async fn mark_notification_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let url = self.endpoint(&["notifications", id.as_str(), "read"])?;
        self.ack(Method::PATCH, url).await
    }

    /// Mark every notification as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["notifications", "mark-all-read"])?;
        self.ack(Method::PATCH, url).await
    }

    /// Delete one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self, id), fields(notification_id = %id))]
    pub async fn delete_notification(&self, id: &NotificationId) -> Result<(), ApiError> {
        let url = self.endpoint(&["notifications", id.as_str()])?;
        self.ack(Method::DELETE, url).await
    }

    /// Delete every notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    #[instrument(skip(self))]
    pub async fn delete_all_notifications(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["notifications", "all"])?;
        self.ack(Method::DELETE, url).await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Build an endpoint URL under the base, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn ack(&self, method: Method, url: Url) -> Result<(), ApiError> {
        let ack: Ack = self.send(method, url, None::<&()>).await?;
        if !ack.success {
            return Err(rejected(ack.message));
        }
        Ok(())
    }

    /// Send a request and decode a JSON body.
    async fn send<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .inner
            .client
            .request(method.clone(), url.clone())
            .header(SESSION_ID_HEADER, &self.inner.installation_id);

        // Read the slot now, not earlier: a logout that already returned must not leak.
        let token = self
            .inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message);
            debug!(
                method = %method,
                path = %url.path(),
                status = %status,
                message = ?message,
                "API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(
                error = %e,
                path = %url.path(),
                body = %text.chars().take(300).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }
}

fn rejected(message: Option<String>) -> ApiError {
    ApiError::Rejected(message.unwrap_or_else(|| "request was not successful".to_string()))
}

fn into_grant(envelope: AuthEnvelope) -> Result<AuthGrant, ApiError> {
    if !envelope.success {
        return Err(rejected(envelope.message));
    }
    let token = envelope
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ApiError::Malformed("token"))?;
    let user = envelope.user.ok_or(ApiError::Malformed("user"))?;
    Ok(AuthGrant { token, user })
}
