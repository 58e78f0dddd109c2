//! Background unread-count polling tied to the admin session.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{FeedError, NotificationFeed};
use crate::session::SessionSnapshot;

/// Handle to the unread-count poller.
///
/// The task is cancelled by [`shutdown`](Self::shutdown) or when the handle
/// is dropped, whichever comes first.
#[derive(Debug)]
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Cancel the poller. Returns `false` if it was already cancelled.
    pub fn shutdown(&mut self) -> bool {
        self.task.take().is_some_and(|task| {
            task.abort();
            true
        })
    }

    /// Whether the poller task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the poller that keeps `feed`'s unread counter fresh.
///
/// While the session is admin the counter is refreshed immediately and then
/// every `every`. As soon as the session stops being admin the timer is
/// dropped and the feed is reset; it starts again if an admin signs in. The
/// task ends when the session channel closes.
///
/// Only one poller should exist per process.
#[must_use]
pub fn spawn_unread_poller(
    feed: NotificationFeed,
    mut session: watch::Receiver<SessionSnapshot>,
    every: Duration,
) -> PollerHandle {
    let task = tokio::spawn(async move {
        loop {
            if !session.borrow_and_update().is_admin() {
                feed.reset();
                if session.changed().await.is_err() {
                    break;
                }
                continue;
            }

            info!(interval_secs = every.as_secs(), "Admin session active, polling notifications");
            if !poll_while_admin(&feed, &mut session, every).await {
                break;
            }
            info!("Admin session ended, notification polling stopped");
        }
        feed.reset();
        debug!("Session channel closed, notification poller exiting");
    });

    PollerHandle { task: Some(task) }
}

/// Poll until the session stops being admin.
///
/// Returns `false` if the session channel closed.
async fn poll_while_admin(
    feed: &NotificationFeed,
    session: &mut watch::Receiver<SessionSnapshot>,
    every: Duration,
) -> bool {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    result = feed.refresh_unread_count() => match result {
                        Ok(count) => debug!(count, "Polled unread notifications"),
                        Err(FeedError::Inactive) => {}
                        Err(e) => warn!(error = %e, "Unread notification poll failed"),
                    },
                    changed = session.changed() => {
                        if changed.is_err() {
                            return false;
                        }
                        if !session.borrow_and_update().is_admin() {
                            return true;
                        }
                    }
                }
            }
            changed = session.changed() => {
                if changed.is_err() {
                    return false;
                }
                if !session.borrow_and_update().is_admin() {
                    return true;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::ClientConfig;
    use crate::models::User;

    fn feed_with_session(initial: SessionSnapshot) -> (NotificationFeed, watch::Sender<SessionSnapshot>) {
        let config = ClientConfig::new("http://127.0.0.1:9/").unwrap();
        let api = ApiClient::new(&config, "test-install").unwrap();
        let (tx, rx) = watch::channel(initial);
        (NotificationFeed::new(api, rx), tx)
    }

    fn admin() -> SessionSnapshot {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "a-1",
            "name": "Root",
            "email": "root@example.com",
            "role": "ADMIN",
        }))
        .unwrap();
        SessionSnapshot::authenticated(user)
    }

    #[tokio::test]
    async fn test_shutdown_cancels_exactly_once() {
        let (feed, tx) = feed_with_session(SessionSnapshot::anonymous());
        let mut handle = spawn_unread_poller(feed, tx.subscribe(), Duration::from_secs(60));

        assert!(handle.is_running());
        assert!(handle.shutdown());
        assert!(!handle.shutdown());
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_exits_when_session_channel_closes() {
        let (feed, tx) = feed_with_session(SessionSnapshot::anonymous());
        let handle = spawn_unread_poller(feed, tx.subscribe(), Duration::from_secs(60));

        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), async {
            while handle.is_running() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_logout_resets_feed() {
        let (feed, tx) = feed_with_session(admin());
        {
            let mut state = feed.lock();
            state.owner = Some(marketplace_core::UserId::new("a-1"));
            state.unread_count = 4;
        }
        let _handle = spawn_unread_poller(feed.clone(), tx.subscribe(), Duration::from_secs(60));

        tx.send_replace(SessionSnapshot::anonymous());
        tokio::time::timeout(Duration::from_secs(5), async {
            while feed.lock().owner.is_some() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(!feed.is_active());
        assert_eq!(feed.lock().unread_count, 0);
    }
}
