//! Admin notification feed and unread poller against the fake API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use marketplace_client::Marketplace;
use marketplace_client::guard::RecordingNavigator;
use marketplace_client::notifications::FeedError;
use marketplace_client::session::Credentials;
use marketplace_client::storage::MemoryStore;
use marketplace_core::NotificationId;
use marketplace_integration_tests::FakeApi;

async fn signed_in(api: &FakeApi, role: &str) -> Marketplace {
    api.add_user("Tester", "tester@example.com", "pw", role);
    let mut config = api.config();
    config.notification_poll_interval = Duration::from_millis(50);

    let mut app = Marketplace::with_store(config, Arc::new(MemoryStore::new())).unwrap();
    app.bootstrap().await;
    app.session_mut()
        .login(&Credentials::new("tester@example.com", "pw"))
        .await
        .unwrap();
    app
}

/// Wait until `check` holds, polling every few milliseconds.
async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_refresh_list_replaces_local_state() {
    let api = FakeApi::start().await;
    api.add_notification("Older", true);
    api.add_notification("Newer", false);
    let app = signed_in(&api, "admin").await;
    let feed = app.notifications();

    feed.refresh_list(20).await.unwrap();

    let titles: Vec<_> = feed.notifications().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, ["Newer", "Older"]);
    assert_eq!(feed.unread_count(), 1);
    assert_eq!(feed.local_unread(), 1);

    let sent = api.requests_to("/notifications");
    assert!(sent.last().unwrap().authorization.is_some());
}

#[tokio::test]
async fn test_mark_read_decrements_once() {
    let api = FakeApi::start().await;
    let id = api.add_notification("Order placed", false);
    api.add_notification("Another", false);
    let app = signed_in(&api, "ADMIN").await;
    let feed = app.notifications();
    feed.refresh_list(20).await.unwrap();
    assert_eq!(feed.unread_count(), 2);

    let id = NotificationId::new(id);
    feed.mark_read(&id).await.unwrap();
    assert_eq!(feed.unread_count(), 1);
    assert_eq!(api.notification_read(id.as_str()), Some(true));

    feed.mark_read(&id).await.unwrap();
    assert_eq!(feed.unread_count(), 1);
}

#[tokio::test]
async fn test_failed_mutation_is_not_rolled_back() {
    let api = FakeApi::start().await;
    let id = api.add_notification("Low stock", false);
    let app = signed_in(&api, "admin").await;
    let feed = app.notifications();
    feed.refresh_list(20).await.unwrap();

    api.fail_mutations(true);
    let err = feed.mark_read(&NotificationId::new(&*id)).await.unwrap_err();
    assert!(matches!(err, FeedError::Api(_)));
    assert_eq!(feed.unread_count(), 0);
    assert_eq!(api.notification_read(&id), Some(false));

    // Refresh is the way back to server truth.
    api.fail_mutations(false);
    feed.refresh_list(20).await.unwrap();
    assert_eq!(feed.unread_count(), 1);
}

#[tokio::test]
async fn test_delete_derives_decrement_from_entry() {
    let api = FakeApi::start().await;
    let read = api.add_notification("Seen", true);
    let unread = api.add_notification("Unseen", false);
    let app = signed_in(&api, "admin").await;
    let feed = app.notifications();
    feed.refresh_list(20).await.unwrap();

    feed.delete(&NotificationId::new(read)).await.unwrap();
    assert_eq!(feed.unread_count(), 1);

    feed.delete(&NotificationId::new(unread)).await.unwrap();
    assert_eq!(feed.unread_count(), 0);
    assert_eq!(api.notification_count(), 0);
}

#[tokio::test]
async fn test_bulk_operations() {
    let api = FakeApi::start().await;
    for title in ["a", "b", "c"] {
        api.add_notification(title, false);
    }
    let app = signed_in(&api, "admin").await;
    let feed = app.notifications();
    feed.refresh_list(2).await.unwrap();
    assert_eq!(feed.notifications().len(), 2);
    assert_eq!(feed.unread_count(), 3);

    feed.mark_all_read().await.unwrap();
    assert_eq!(feed.unread_count(), 0);
    assert_eq!(feed.refresh_unread_count().await.unwrap(), 0);

    feed.delete_all().await.unwrap();
    assert!(feed.notifications().is_empty());
    assert_eq!(api.notification_count(), 0);
}

#[tokio::test]
async fn test_non_admin_feed_is_inactive_and_silent() {
    let api = FakeApi::start().await;
    api.add_notification("Hidden", false);
    let app = signed_in(&api, "vendor").await;
    api.clear_requests();

    let feed = app.notifications();
    assert!(matches!(feed.refresh_list(20).await, Err(FeedError::Inactive)));
    assert!(matches!(feed.refresh_unread_count().await, Err(FeedError::Inactive)));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_feed_hidden_after_logout_without_poller() {
    let api = FakeApi::start().await;
    api.add_notification("Refund requested", false);
    let mut app = signed_in(&api, "admin").await;
    let feed = app.notifications().clone();
    feed.refresh_list(20).await.unwrap();
    assert_eq!(feed.unread_count(), 1);

    app.session_mut().logout(&mut RecordingNavigator::default());
    assert!(feed.notifications().is_empty());
    assert_eq!(feed.unread_count(), 0);

    // The next session is a vendor; nothing from the admin carries over.
    api.add_user("Vera", "vera@example.com", "pw", "vendor");
    app.session_mut()
        .login(&Credentials::new("vera@example.com", "pw"))
        .await
        .unwrap();
    assert!(feed.notifications().is_empty());
    assert_eq!(feed.unread_count(), 0);
}

#[tokio::test]
async fn test_poller_follows_admin_session() {
    let api = FakeApi::start().await;
    api.add_notification("New vendor application", false);
    let mut app = signed_in(&api, "admin").await;

    app.start_notification_poller();
    let feed = app.notifications().clone();
    eventually(|| feed.unread_count() == 1).await;
    eventually(|| api.requests_to("/unread-count").len() >= 2).await;

    let mut navigator = RecordingNavigator::default();
    app.session_mut().logout(&mut navigator);
    eventually(|| feed.unread_count() == 0).await;

    // No polls after the session stopped being admin.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = api.requests_to("/unread-count").len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(api.requests_to("/unread-count").len(), settled);

    assert!(app.stop_notification_poller());
}
