//! Session manager: the single source of truth for "who is signed in".
//!
//! [`SessionManager`] owns the session and is the only thing that mutates
//! it. Everything else observes it through a [`watch`] channel handed out by
//! [`SessionManager::subscribe`], which carries a fresh [`SessionSnapshot`]
//! after every transition.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► Resolving ──bootstrap()──► Authenticated | Anonymous
//!                                          ▲    │
//!                          login/register ─┘    └─ logout
//! ```
//!
//! Mutating methods take `&mut self`, so a login can never interleave with
//! an in-flight bootstrap or another login.
//!
//! # Durability
//!
//! Successful transitions write the token and user snapshot to the durable
//! store before they are published, so a restart right after a login resumes
//! the session.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use marketplace_core::{Email, Role, SessionStatus};

use crate::api::{ApiClient, AuthGrant, RegisterRequest};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::guard::Navigator;
use crate::models::User;
use crate::roles;
use crate::storage::{self, KeyValueStore, keys};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current status.
    pub status: SessionStatus,
    /// Signed-in user; `Some` exactly when `status` is `Authenticated`.
    pub user: Option<User>,
}

impl SessionSnapshot {
    /// Snapshot for an unresolved session.
    #[must_use]
    pub const fn resolving() -> Self {
        Self {
            status: SessionStatus::Resolving,
            user: None,
        }
    }

    /// Snapshot for a signed-out session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            user: None,
        }
    }

    /// Snapshot for a signed-in user.
    #[must_use]
    pub const fn authenticated(user: User) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
        }
    }

    /// Canonical role of the session; `Guest` unless authenticated.
    #[must_use]
    pub fn role(&self) -> Role {
        match (&self.status, &self.user) {
            (SessionStatus::Authenticated, Some(user)) => user.role,
            _ => Role::Guest,
        }
    }

    /// Whether an administrator is signed in.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

/// Email/password sign-in form.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from raw form input.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Account registration form.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: Option<String>,
    /// Requested role; the server decides whether to honor it.
    pub role: Option<Role>,
}

/// Owner of the authentication token and current-user snapshot.
pub struct SessionManager {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    updates: watch::Sender<SessionSnapshot>,
    bootstrapped: bool,
}

impl SessionManager {
    /// Create a manager in the `Resolving` state.
    ///
    /// Nothing is read until [`bootstrap`](Self::bootstrap) runs.
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::resolving());
        Self {
            api,
            store,
            updates,
            bootstrapped: false,
        }
    }

    /// Subscribe to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.updates.borrow().clone()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.updates.borrow().status
    }

    /// Current user, if signed in.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.updates.borrow().user.clone()
    }

    /// Canonical role of the current session.
    #[must_use]
    pub fn role(&self) -> Role {
        self.updates.borrow().role()
    }

    /// API client whose credential this manager controls.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Resume a persisted session.
    ///
    /// Runs at most once per manager; later calls return the current status
    /// without I/O. Any failure (no token, rejected token, network error,
    /// malformed profile) discards the persisted token and user and ends in
    /// `Anonymous`. Failures are not reported: a stale session simply looks
    /// signed out.
    #[instrument(skip(self))]
    pub async fn bootstrap(&mut self) -> SessionStatus {
        if self.bootstrapped {
            return self.status();
        }
        self.bootstrapped = true;

        let Some(token) = storage::load_string(self.store.as_ref(), keys::TOKEN) else {
            debug!("No persisted token, session is anonymous");
            self.discard_persisted();
            self.publish(SessionSnapshot::anonymous());
            return SessionStatus::Anonymous;
        };

        self.api.set_token(&token);

        match self.api.me().await {
            Ok(user) => {
                if let Err(e) = storage::save_json(self.store.as_ref(), keys::USER, &user) {
                    warn!(error = %e, "Failed to persist refreshed user snapshot");
                }
                info!(user_id = %user.id, role = %user.role, "Session resumed");
                self.signed_in(user, "Session resumed");
                SessionStatus::Authenticated
            }
            Err(e) => {
                debug!(error = %e, "Persisted token could not be resumed, discarding");
                self.api.clear_token();
                self.discard_persisted();
                self.publish(SessionSnapshot::anonymous());
                SessionStatus::Anonymous
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` when validation fails, the server refuses the
    /// credentials, or the session cannot be persisted. The session is left
    /// unchanged in every error case.
    #[instrument(skip(self, credentials))]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<User, AuthError> {
        let email = Email::parse(&credentials.email)?;
        let password = credentials.password.expose_secret();
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let grant = self.api.login(email.as_str(), password).await?;
        self.establish(grant)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Same contract as [`login`](Self::login).
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&mut self, registration: &Registration) -> Result<User, AuthError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(&registration.email)?;
        let password = registration.password.expose_secret();
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let request = RegisterRequest {
            name,
            email: email.as_str(),
            password,
            phone: registration
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty()),
            role: registration.role.map(Role::as_str),
        };

        let grant = self.api.register(&request).await?;
        self.establish(grant)
    }

    /// Replace the current user snapshot after a profile edit.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` when nobody is signed in, or
    /// `AuthError::Storage` if the snapshot cannot be persisted (in which
    /// case the old snapshot stays current).
    pub fn update_profile(&mut self, user: User) -> Result<User, AuthError> {
        if self.status() != SessionStatus::Authenticated {
            return Err(AuthError::NotAuthenticated);
        }
        storage::save_json(self.store.as_ref(), keys::USER, &user)?;
        self.publish(SessionSnapshot::authenticated(user.clone()));
        Ok(user)
    }

    /// Sign out and navigate to the public home page.
    ///
    /// Detaches the credential first, so no request issued after this call
    /// carries the old token.
    #[instrument(skip(self, navigator))]
    pub fn logout(&mut self, navigator: &mut dyn Navigator) {
        self.api.clear_token();
        self.discard_persisted();
        self.bootstrapped = true;
        self.publish(SessionSnapshot::anonymous());
        clear_sentry_user();
        add_breadcrumb("session", "Signed out", None);
        info!("Signed out");
        navigator.replace(roles::PUBLIC_HOME, None);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Persist a fresh grant, attach it, and publish the authenticated state.
    ///
    /// The token and user are both written before anything else changes; if
    /// the user write fails the token record goes back to what it held before.
    fn establish(&mut self, grant: AuthGrant) -> Result<User, AuthError> {
        let AuthGrant { token, user } = grant;

        let previous = self.store.get(keys::TOKEN)?;
        self.store.set(keys::TOKEN, &token)?;
        if let Err(e) = storage::save_json(self.store.as_ref(), keys::USER, &user) {
            let restored = match &previous {
                Some(prior) => self.store.set(keys::TOKEN, prior),
                None => self.store.remove(keys::TOKEN),
            };
            if let Err(rollback) = restored {
                warn!(error = %rollback, "Failed to roll back persisted token");
            }
            return Err(e.into());
        }

        self.api.set_token(&token);
        // A fresh sign-in supersedes anything a later bootstrap could resume.
        self.bootstrapped = true;
        info!(user_id = %user.id, role = %user.role, "Signed in");
        self.signed_in(user.clone(), "Signed in");
        Ok(user)
    }

    fn signed_in(&self, user: User, breadcrumb: &str) {
        set_sentry_user(&user.id, Some(user.email.as_str()));
        add_breadcrumb("session", breadcrumb, Some(&[("role", user.role.as_str())]));
        self.publish(SessionSnapshot::authenticated(user));
    }

    fn discard_persisted(&self) {
        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to discard persisted session record");
            }
        }
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        self.updates.send_replace(snapshot);
    }
}
