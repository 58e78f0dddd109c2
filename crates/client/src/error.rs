//! Unified error type and Sentry helpers.
//!
//! Each store has its own error enum; [`ClientError`] gathers them for
//! front ends that drive several stores and only need to show one message.
//! Nothing in this crate panics into the caller: every fallible operation
//! returns one of these.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::notifications::FeedError;
use crate::session::AuthError;
use crate::storage::StorageError;

/// Any error the client engine can produce.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Sign-in, registration or profile update failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Durable store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Notification feed operation failed.
    #[error("Notification error: {0}")]
    Feed(#[from] FeedError),

    /// Caller supplied bad input.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ClientError {
    /// Message safe to show to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) => err.user_message(),
            Self::Feed(err) => err.user_message(),
            Self::Storage(_) => "Could not save changes on this device".to_string(),
            Self::Api(_) => "Something went wrong talking to the server".to_string(),
            Self::Config(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Call this after a session becomes authenticated to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user-visible transition.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("session", "Signed in", Some(&[("role", "VENDOR")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
