//! Application bundle wiring the stores together.

use std::sync::Arc;

use tracing::{debug, info};

use marketplace_core::SessionStatus;

use crate::api::ApiClient;
use crate::collections::{Cart, Wishlist};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::guard::{GuardDecision, Navigator, RouteGuard, RouteTable};
use crate::notifications::{NotificationFeed, PollerHandle, spawn_unread_poller};
use crate::session::SessionManager;
use crate::storage::{self, FileStore, KeyValueStore};

/// Everything a front end needs, built from one configuration.
///
/// Owns the [`SessionManager`]; other stores observe the session through its
/// update channel.
pub struct Marketplace {
    config: ClientConfig,
    store: Arc<dyn KeyValueStore>,
    session: SessionManager,
    cart: Cart,
    wishlist: Wishlist,
    feed: NotificationFeed,
    guard: RouteGuard,
    poller: Option<PollerHandle>,
}

impl Marketplace {
    /// Open the marketplace with a file-backed store under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let store = FileStore::open(&config.data_dir)?;
        Self::with_store(config, Arc::new(store))
    }

    /// Open the marketplace over an arbitrary store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_store(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let installation_id = storage::installation_id(store.as_ref());
        let api = ApiClient::new(&config, installation_id)?;
        let session = SessionManager::new(api.clone(), Arc::clone(&store));
        let feed = NotificationFeed::new(api, session.subscribe());

        let app = Self {
            cart: Cart::open(Arc::clone(&store)),
            wishlist: Wishlist::open(Arc::clone(&store)),
            guard: RouteGuard::new(RouteTable::marketplace()),
            poller: None,
            config,
            store,
            session,
            feed,
        };
        debug!(api = %app.config.api_url, "Marketplace client ready");
        Ok(app)
    }

    /// Resume the persisted session. See [`SessionManager::bootstrap`].
    pub async fn bootstrap(&mut self) -> SessionStatus {
        self.session.bootstrap().await
    }

    /// Start polling unread notifications for admin sessions.
    ///
    /// Does nothing if the poller is already running. Must be called from
    /// within a Tokio runtime.
    pub fn start_notification_poller(&mut self) {
        if self.poller.as_ref().is_some_and(PollerHandle::is_running) {
            return;
        }
        info!("Starting notification poller");
        self.poller = Some(spawn_unread_poller(
            self.feed.clone(),
            self.session.subscribe(),
            self.config.notification_poll_interval,
        ));
    }

    /// Stop the notification poller. Returns whether one was running.
    pub fn stop_notification_poller(&mut self) -> bool {
        self.poller.take().is_some_and(|mut handle| handle.shutdown())
    }

    /// Guard a navigation to `path` against the current session.
    pub fn navigate(&self, path: &str, navigator: &mut dyn Navigator) -> GuardDecision {
        self.guard.enforce(&self.session.snapshot(), path, navigator)
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub const fn wishlist_mut(&mut self) -> &mut Wishlist {
        &mut self.wishlist
    }

    /// Shared notification feed handle.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationFeed {
        &self.feed
    }

    #[must_use]
    pub const fn guard(&self) -> &RouteGuard {
        &self.guard
    }
}
