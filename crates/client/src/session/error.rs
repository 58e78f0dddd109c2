//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors that can occur during sign-in, registration or profile updates.
///
/// None of these change the session: a failed attempt leaves the status
/// exactly as it was.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marketplace_core::EmailError),

    /// Password left empty.
    #[error("password is required")]
    MissingPassword,

    /// Display name left empty on registration.
    #[error("name is required")]
    MissingName,

    /// Remote API refused the request or could not be reached.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Token or user snapshot could not be persisted.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The operation needs an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// Human-readable message for display next to the form.
    ///
    /// Server-provided messages are passed through; transport details are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            Self::MissingPassword => "Please enter your password".to_string(),
            Self::MissingName => "Please enter your name".to_string(),
            Self::Api(err) => {
                if let Some(message) = err.server_message() {
                    return message.to_string();
                }
                match err {
                    ApiError::Http(_) => {
                        "Unable to reach the server. Check your connection and try again."
                            .to_string()
                    }
                    ApiError::RateLimited(secs) => {
                        format!("Too many attempts. Please wait {secs} seconds and try again.")
                    }
                    err if err.is_unauthorized() => "Invalid email or password".to_string(),
                    _ => "Something went wrong. Please try again.".to_string(),
                }
            }
            Self::Storage(_) => "Could not save your session on this device".to_string(),
            Self::NotAuthenticated => "You are not signed in".to_string(),
        }
    }
}
