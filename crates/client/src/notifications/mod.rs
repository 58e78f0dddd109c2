//! Admin notification feed.
//!
//! The feed is only live while an administrator is signed in; every
//! operation checks the session first and fails with
//! [`FeedError::Inactive`] without touching the network otherwise.
//!
//! # Consistency
//!
//! Mutations are optimistic: the local list and counter change before the
//! remote call is made, and a failed call is reported but not rolled back.
//! [`NotificationFeed::refresh_list`] is the way back to server truth.
//!
//! The unread counter is the server's figure, adjusted locally. Each local
//! mutation moves it by exactly the number of locally held entries whose
//! `read` flag it flipped or removed, so it never drifts from what the
//! server will report after the mutation lands. [`NotificationFeed::local_unread`]
//! reports the unread entries actually held.
//!
//! # Teardown
//!
//! [`NotificationFeed::reset`] empties the feed and bumps an epoch. Any
//! remote result that was requested before the reset is discarded when it
//! arrives, as is any result that lands after the session stopped being admin.
//!
//! Held state belongs to the administrator who fetched it. The getters read
//! as empty for any other session, and the first operation under a different
//! administrator resets the feed, whether or not a poller is running.

mod poller;

pub use poller::{PollerHandle, spawn_unread_poller};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument};

use marketplace_core::{NotificationId, UserId};

use crate::api::{ApiClient, ApiError};
use crate::models::Notification;
use crate::session::SessionSnapshot;

/// Errors from feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The current session is not an administrator.
    #[error("notification feed is only available to administrators")]
    Inactive,

    /// The remote call failed. Local optimistic changes were kept.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FeedError {
    /// Message safe to show to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Inactive => "Notifications are only available to administrators".to_string(),
            Self::Api(err) => err
                .server_message()
                .map_or_else(|| "Could not reach the notification service".to_string(), str::to_string),
        }
    }
}

#[derive(Debug, Default)]
struct FeedState {
    /// Administrator the held entries were fetched for.
    owner: Option<UserId>,
    notifications: Vec<Notification>,
    unread_count: u64,
    epoch: u64,
}

struct FeedInner {
    api: ApiClient,
    session: watch::Receiver<SessionSnapshot>,
    state: Mutex<FeedState>,
}

/// Shared handle to the notification feed.
///
/// Clones share state. The internal lock is never held across an `.await`.
#[derive(Clone)]
pub struct NotificationFeed {
    inner: Arc<FeedInner>,
}

impl std::fmt::Debug for NotificationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("NotificationFeed")
            .field("notifications", &state.notifications.len())
            .field("unread_count", &state.unread_count)
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

impl NotificationFeed {
    /// Create an empty feed that follows `session`.
    #[must_use]
    pub fn new(api: ApiClient, session: watch::Receiver<SessionSnapshot>) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                api,
                session,
                state: Mutex::new(FeedState::default()),
            }),
        }
    }

    /// Whether an administrator is signed in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.session.borrow().is_admin()
    }

    /// Locally held notifications, most recent first. Empty unless the
    /// administrator they were fetched for is still signed in.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.visible(|state| state.notifications.clone())
    }

    /// Unread counter; 0 outside the owning admin session.
    #[must_use]
    pub fn unread_count(&self) -> u64 {
        self.visible(|state| state.unread_count)
    }

    /// Number of locally held entries that are unread.
    #[must_use]
    pub fn local_unread(&self) -> usize {
        self.visible(|state| state.notifications.iter().filter(|n| !n.read).count())
    }

    /// Replace local state with the server's latest `limit` notifications.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Inactive` for non-admin sessions, or
    /// `FeedError::Api` if the fetch fails (local state is kept).
    #[instrument(skip(self))]
    pub async fn refresh_list(&self, limit: u32) -> Result<(), FeedError> {
        let epoch = self.begin()?;
        let list = self.inner.api.list_notifications(limit).await?;

        self.apply(epoch, |state| {
            state.notifications = list.notifications;
            state.unread_count = list.unread_count;
        });
        Ok(())
    }

    /// Update only the unread counter from the server.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Inactive` for non-admin sessions, or
    /// `FeedError::Api` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn refresh_unread_count(&self) -> Result<u64, FeedError> {
        let epoch = self.begin()?;
        let count = self.inner.api.unread_count().await?;

        self.apply(epoch, |state| state.unread_count = count);
        Ok(count)
    }

    /// Mark one notification as read.
    ///
    /// The counter drops by one only if the entry is held locally and was
    /// unread; marking an already-read entry leaves it alone. The server is
    /// told either way.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Inactive` for non-admin sessions, or
    /// `FeedError::Api` if the server call fails (the local flip stays).
    #[instrument(skip(self, id), fields(notification_id = %id))]
    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), FeedError> {
        self.begin()?;
        {
            let mut state = self.lock();
            let flipped = state
                .notifications
                .iter_mut()
                .find(|n| &n.id == id && !n.read)
                .map(|n| n.read = true)
                .is_some();
            if flipped {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
        }

        self.inner.api.mark_notification_read(id).await?;
        Ok(())
    }

    /// Mark every notification as read.
    ///
    /// # Errors
    ///
    /// Same contract as [`mark_read`](Self::mark_read).
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self) -> Result<(), FeedError> {
        self.begin()?;
        {
            let mut state = self.lock();
            for notification in &mut state.notifications {
                notification.read = true;
            }
            state.unread_count = 0;
        }

        self.inner.api.mark_all_notifications_read().await?;
        Ok(())
    }

    /// Delete one notification.
    ///
    /// The counter drops only if the removed entry was unread at the time.
    ///
    /// # Errors
    ///
    /// Same contract as [`mark_read`](Self::mark_read).
    #[instrument(skip(self, id), fields(notification_id = %id))]
    pub async fn delete(&self, id: &NotificationId) -> Result<(), FeedError> {
        self.begin()?;
        {
            let mut state = self.lock();
            if let Some(index) = state.notifications.iter().position(|n| &n.id == id) {
                let removed = state.notifications.remove(index);
                if !removed.read {
                    state.unread_count = state.unread_count.saturating_sub(1);
                }
            }
        }

        self.inner.api.delete_notification(id).await?;
        Ok(())
    }

    /// Delete every notification.
    ///
    /// # Errors
    ///
    /// Same contract as [`mark_read`](Self::mark_read).
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> Result<(), FeedError> {
        self.begin()?;
        {
            let mut state = self.lock();
            state.notifications.clear();
            state.unread_count = 0;
        }

        self.inner.api.delete_all_notifications().await?;
        Ok(())
    }

    /// Empty the feed and invalidate every in-flight result.
    pub fn reset(&self) {
        Self::clear(&mut self.lock());
    }

    fn clear(state: &mut FeedState) {
        state.owner = None;
        state.notifications.clear();
        state.unread_count = 0;
        state.epoch = state.epoch.wrapping_add(1);
        debug!(epoch = state.epoch, "Notification feed reset");
    }

    /// Signed-in administrator, if any.
    fn current_admin(&self) -> Option<UserId> {
        let session = self.inner.session.borrow();
        session
            .user
            .as_ref()
            .filter(|_| session.is_admin())
            .map(|user| user.id.clone())
    }

    fn visible<T: Default>(&self, read: impl FnOnce(&FeedState) -> T) -> T {
        let admin = self.current_admin();
        let state = self.lock();
        if admin.is_some() && state.owner == admin {
            read(&state)
        } else {
            T::default()
        }
    }

    /// Check the session, take ownership for the current administrator and
    /// capture the epoch.
    fn begin(&self) -> Result<u64, FeedError> {
        let admin = self.current_admin().ok_or(FeedError::Inactive)?;
        let mut state = self.lock();
        if state.owner.as_ref() != Some(&admin) {
            if state.owner.is_some() {
                Self::clear(&mut state);
            }
            state.owner = Some(admin);
        }
        Ok(state.epoch)
    }

    /// Apply a remote result unless the feed was reset or the session
    /// stopped being the owning admin while it was in flight.
    fn apply(&self, epoch: u64, change: impl FnOnce(&mut FeedState)) {
        let admin = self.current_admin();
        let mut state = self.lock();
        if admin.is_none() || state.owner != admin {
            debug!("Discarding notification result for inactive session");
            return;
        }
        if state.epoch != epoch {
            debug!(requested = epoch, current = state.epoch, "Discarding stale notification result");
            return;
        }
        change(&mut state);
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
