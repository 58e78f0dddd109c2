//! Command implementations.
//!
//! Each command prints its result to stdout; diagnostics go through
//! `tracing` to stderr.

pub mod cart;
pub mod notifications;
pub mod route;
pub mod session;
pub mod wishlist;

use marketplace_client::ClientError;
use marketplace_client::notifications::FeedError;
use marketplace_client::session::AuthError;
use marketplace_client::storage::StorageError;
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    /// The client engine failed. Displays the user-facing message.
    #[error("{}", .0.user_message())]
    Client(#[from] ClientError),

    /// A command-line argument could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        Self::Client(err.into())
    }
}

impl From<FeedError> for CliError {
    fn from(err: FeedError) -> Self {
        Self::Client(err.into())
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        Self::Client(err.into())
    }
}
