//! Wire types for the marketplace REST API.

use serde::{Deserialize, Serialize};

use crate::models::{Notification, User};

/// Response envelope shared by the `/auth/*` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthEnvelope {
    /// Whether the request succeeded.
    #[serde(default)]
    pub success: bool,
    /// Bearer token issued on login/registration.
    #[serde(default)]
    pub token: Option<String>,
    /// The authenticated user.
    #[serde(default)]
    pub user: Option<User>,
    /// Human-readable message, usually set on failure.
    #[serde(default)]
    pub message: Option<String>,
}

/// A token plus the user it belongs to.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    /// Bearer token.
    pub token: String,
    /// Authenticated user.
    pub user: User,
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
}

/// `GET /notifications` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    #[serde(default)]
    pub success: bool,
    /// Most recent notifications first.
    #[serde(default, alias = "data")]
    pub notifications: Vec<Notification>,
    /// Authoritative unread total.
    #[serde(default)]
    pub unread_count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /notifications/unread-count` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    #[serde(default)]
    pub success: bool,
    #[serde(default, alias = "unreadCount")]
    pub count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the notification mutation endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body sent with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}
