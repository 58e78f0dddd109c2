//! Session lifecycle against the fake API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use marketplace_client::Marketplace;
use marketplace_client::guard::RecordingNavigator;
use marketplace_client::models::User;
use marketplace_client::session::{AuthError, Credentials, Registration};
use marketplace_client::storage::{self, FileStore, KeyValueStore, MemoryStore, keys};
use marketplace_core::{Role, SessionStatus};
use marketplace_integration_tests::FakeApi;
use secrecy::SecretString;
use tempfile::TempDir;

fn app(api: &FakeApi, store: Arc<dyn KeyValueStore>) -> Marketplace {
    Marketplace::with_store(api.config(), store).unwrap()
}

// =============================================================================
// Bootstrap
// =============================================================================

#[tokio::test]
async fn test_bootstrap_with_invalid_token_ends_anonymous() {
    let api = FakeApi::start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(keys::TOKEN, "revoked-token").unwrap();
    store
        .set(
            keys::USER,
            r#"{"id":"u9","name":"Ghost","email":"ghost@example.com","role":"buyer"}"#,
        )
        .unwrap();

    let mut app = app(&api, store.clone());
    let rx = app.session().subscribe();
    assert_eq!(rx.borrow().status, SessionStatus::Resolving);

    assert_eq!(app.bootstrap().await, SessionStatus::Anonymous);
    assert_eq!(rx.borrow().status, SessionStatus::Anonymous);
    assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    assert_eq!(store.get(keys::USER).unwrap(), None);

    let me = api.requests_to("/auth/me");
    assert_eq!(me.len(), 1);
    assert_eq!(me[0].authorization.as_deref(), Some("Bearer revoked-token"));
}

#[tokio::test]
async fn test_bootstrap_resumes_and_refreshes_user() {
    let api = FakeApi::start().await;
    let token = api.add_user("Vera", "vera@example.com", "pw", "Vendor");
    let store = Arc::new(MemoryStore::new());
    store.set(keys::TOKEN, &token).unwrap();

    let mut app = app(&api, store.clone());
    assert_eq!(app.bootstrap().await, SessionStatus::Authenticated);

    let user = app.session().current_user().unwrap();
    assert_eq!(user.name, "Vera");
    // Role casing from the server is normalized once, on the way in.
    assert_eq!(user.role, Role::Vendor);

    let persisted: User = storage::load_json(store.as_ref(), keys::USER).unwrap();
    assert_eq!(persisted, user);
}

#[tokio::test]
async fn test_bootstrap_without_token_makes_no_request() {
    let api = FakeApi::start().await;
    let mut app = app(&api, Arc::new(MemoryStore::new()));

    assert_eq!(app.bootstrap().await, SessionStatus::Anonymous);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_bootstrap_runs_once() {
    let api = FakeApi::start().await;
    let token = api.add_user("Bo", "bo@example.com", "pw", "buyer");
    let store = Arc::new(MemoryStore::new());
    store.set(keys::TOKEN, &token).unwrap();

    let mut app = app(&api, store);
    app.bootstrap().await;
    app.bootstrap().await;
    assert_eq!(api.requests_to("/auth/me").len(), 1);
}

// =============================================================================
// Login / register
// =============================================================================

#[tokio::test]
async fn test_login_persists_and_attaches_credential() {
    let api = FakeApi::start().await;
    let token = api.add_user("Ada", "ada@example.com", "hunter22", "buyer");
    let store = Arc::new(MemoryStore::new());

    let mut app = app(&api, store.clone());
    app.bootstrap().await;

    let user = app
        .session_mut()
        .login(&Credentials::new("Ada@Example.com", "hunter22"))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Buyer);
    assert_eq!(app.session().status(), SessionStatus::Authenticated);
    assert_eq!(store.get(keys::TOKEN).unwrap().as_deref(), Some(token.as_str()));

    // A fresh process resumes the session from the store.
    let mut restarted = Marketplace::with_store(api.config(), store).unwrap();
    assert_eq!(restarted.bootstrap().await, SessionStatus::Authenticated);
    let me = api.requests_to("/auth/me");
    assert_eq!(
        me.last().unwrap().authorization.as_deref(),
        Some(format!("Bearer {token}").as_str())
    );
}

#[tokio::test]
async fn test_login_failure_surfaces_server_message() {
    let api = FakeApi::start().await;
    api.add_user("Ada", "ada@example.com", "hunter22", "buyer");
    let store = Arc::new(MemoryStore::new());

    let mut app = app(&api, store.clone());
    app.bootstrap().await;

    let err = app
        .session_mut()
        .login(&Credentials::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Api(_)));
    assert_eq!(err.user_message(), "Invalid email or password");
    assert_eq!(app.session().status(), SessionStatus::Anonymous);
    assert_eq!(store.get(keys::TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_register_signs_in() {
    let api = FakeApi::start().await;
    let mut app = app(&api, Arc::new(MemoryStore::new()));
    app.bootstrap().await;

    let registration = Registration {
        name: "Vic".to_string(),
        email: "vic@example.com".to_string(),
        password: SecretString::from("s3cret".to_string()),
        phone: Some("+1 555 0100".to_string()),
        role: Some(Role::Vendor),
    };
    let user = app.session_mut().register(&registration).await.unwrap();

    assert_eq!(user.role, Role::Vendor);
    assert_eq!(user.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(app.session().role(), Role::Vendor);

    // Same email again is refused with the server's message.
    let err = app.session_mut().register(&registration).await.unwrap_err();
    assert_eq!(err.user_message(), "User already exists");
    assert_eq!(app.session().role(), Role::Vendor);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_detaches_credential_immediately() {
    let api = FakeApi::start().await;
    api.add_user("Ada", "ada@example.com", "hunter22", "admin");
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());

    let mut app = app(&api, Arc::clone(&store));
    app.bootstrap().await;
    app.session_mut()
        .login(&Credentials::new("ada@example.com", "hunter22"))
        .await
        .unwrap();

    let mut navigator = RecordingNavigator::default();
    app.session_mut().logout(&mut navigator);

    assert_eq!(app.session().status(), SessionStatus::Anonymous);
    assert_eq!(navigator.last_path(), Some("/"));
    assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    assert_eq!(store.get(keys::USER).unwrap(), None);

    // The next outbound request carries no credential.
    api.clear_requests();
    let _ = app.session().api().unread_count().await;
    let sent = api.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].authorization, None);
    assert!(sent[0].session_id.is_some());
}

#[tokio::test]
async fn test_installation_id_sent_with_every_request() {
    let api = FakeApi::start().await;
    api.add_user("Ada", "ada@example.com", "hunter22", "buyer");
    let store = Arc::new(MemoryStore::new());

    let mut app = app(&api, store.clone());
    app.bootstrap().await;
    let _ = app
        .session_mut()
        .login(&Credentials::new("ada@example.com", "hunter22"))
        .await;

    let expected = store.get(keys::SESSION_ID).unwrap().unwrap();
    let requests = api.requests();
    assert!(!requests.is_empty());
    assert!(
        requests
            .iter()
            .all(|r| r.session_id.as_deref() == Some(expected.as_str()))
    );
}
