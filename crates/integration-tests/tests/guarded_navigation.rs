//! Guarded navigation through a full sign-in round trip.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use marketplace_client::Marketplace;
use marketplace_client::collections::LineItemCollection;
use marketplace_client::guard::{GuardDecision, RecordingNavigator, RedirectState};
use marketplace_client::models::ProductSnapshot;
use marketplace_client::roles::post_login_destination;
use marketplace_client::session::Credentials;
use marketplace_client::storage::MemoryStore;
use marketplace_core::{Price, ProductId};
use marketplace_integration_tests::FakeApi;

#[tokio::test]
async fn test_anonymous_is_sent_to_login_and_back() {
    let api = FakeApi::start().await;
    api.add_user("Bea", "bea@example.com", "pw", "buyer");
    let mut app = Marketplace::with_store(api.config(), Arc::new(MemoryStore::new())).unwrap();
    let mut navigator = RecordingNavigator::default();

    // Nothing is decided while the session resolves.
    assert_eq!(app.navigate("/profile", &mut navigator), GuardDecision::Loading);
    assert!(navigator.history.is_empty());

    app.bootstrap().await;
    let decision = app.navigate("/profile", &mut navigator);
    assert_eq!(
        decision,
        GuardDecision::Redirect {
            to: "/login".to_string(),
            state: Some(RedirectState {
                from: "/profile".to_string()
            }),
        }
    );

    let from = navigator.history.last().unwrap().state.clone().unwrap().from;
    let user = app
        .session_mut()
        .login(&Credentials::new("bea@example.com", "pw"))
        .await
        .unwrap();
    let destination = post_login_destination(user.role, Some(from.as_str()), app.guard().routes());
    assert_eq!(destination, "/profile");
    assert_eq!(app.navigate(&destination, &mut navigator), GuardDecision::Render);

    // Signed in, the login form bounces to the landing page.
    app.navigate("/login", &mut navigator);
    assert_eq!(navigator.last_path(), Some("/"));
}

#[tokio::test]
async fn test_protected_sub_pages_need_sign_in() {
    let api = FakeApi::start().await;
    let mut app = Marketplace::with_store(api.config(), Arc::new(MemoryStore::new())).unwrap();
    app.bootstrap().await;

    let mut navigator = RecordingNavigator::default();
    for path in ["/profile/edit", "/checkout/confirm", "/wishlist/shared"] {
        app.navigate(path, &mut navigator);
        let nav = navigator.history.last().unwrap();
        assert_eq!(nav.to, "/login");
        assert_eq!(nav.state.as_ref().unwrap().from, path);
    }
}

#[tokio::test]
async fn test_buyer_cannot_reach_vendor_area() {
    let api = FakeApi::start().await;
    api.add_user("Bea", "bea@example.com", "pw", "buyer");
    let mut app = Marketplace::with_store(api.config(), Arc::new(MemoryStore::new())).unwrap();
    app.bootstrap().await;
    app.session_mut()
        .login(&Credentials::new("bea@example.com", "pw"))
        .await
        .unwrap();

    let mut navigator = RecordingNavigator::default();
    let decision = app.navigate("/vendor/products", &mut navigator);
    assert_eq!(
        decision,
        GuardDecision::Redirect {
            to: "/".to_string(),
            state: None
        }
    );
}

#[tokio::test]
async fn test_cart_survives_sign_out() {
    let api = FakeApi::start().await;
    api.add_user("Bea", "bea@example.com", "pw", "buyer");
    let store = Arc::new(MemoryStore::new());
    let mut app = Marketplace::with_store(api.config(), store.clone()).unwrap();
    app.bootstrap().await;
    app.session_mut()
        .login(&Credentials::new("bea@example.com", "pw"))
        .await
        .unwrap();

    let mug = ProductSnapshot {
        id: ProductId::new("mug"),
        name: "Mug".to_string(),
        price: Price::from_cents(1250),
        image: None,
        vendor_id: None,
    };
    app.cart_mut().add(mug.clone(), 1).unwrap();
    app.cart_mut().add(mug, 2).unwrap();
    app.session_mut().logout(&mut RecordingNavigator::default());

    let reopened = Marketplace::with_store(api.config(), store).unwrap();
    assert_eq!(reopened.cart().quantity_of(&ProductId::new("mug")), 3);
    assert_eq!(reopened.cart().total(), Price::from_cents(3750));
}
