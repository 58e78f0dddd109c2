//! Integration test support for the marketplace client.
//!
//! [`FakeApi`] is an in-process axum server that speaks the marketplace REST
//! contract. Each test starts its own instance on `127.0.0.1:0`, seeds it
//! with accounts and notifications, points a [`ClientConfig`] at it, and can
//! inspect every request the client made.
//!
//! # Example
//!
//! ```rust,ignore
//! let api = FakeApi::start().await;
//! api.add_user("Ada", "ada@example.com", "hunter22", "admin");
//!
//! let mut app = Marketplace::with_store(api.config(), Arc::new(MemoryStore::new()))?;
//! app.bootstrap().await;
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use marketplace_client::ClientConfig;
use marketplace_client::api::SESSION_ID_HEADER;

/// A request observed by the fake API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Raw `Authorization` header, if sent.
    pub authorization: Option<String>,
    /// `X-Session-Id` header, if sent.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
struct Account {
    user: Value,
    password: String,
    token: String,
}

#[derive(Debug, Default)]
struct Data {
    accounts: Vec<Account>,
    notifications: Vec<Value>,
    requests: Vec<RecordedRequest>,
    fail_mutations: bool,
    next_id: u64,
}

#[derive(Debug, Default)]
struct FakeState {
    data: Mutex<Data>,
}

impl FakeState {
    fn lock(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process fake of the marketplace API.
pub struct FakeApi {
    addr: SocketAddr,
    state: Arc<FakeState>,
    server: JoinHandle<()>,
}

impl FakeApi {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API listener");
        let addr = listener.local_addr().expect("Failed to read fake API address");

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL of the fake API.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Panics if the URL is rejected, which would be a bug in the fake.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.url()).expect("Fake API URL should be valid")
    }

    /// Create an account and return its token.
    ///
    /// `role` is stored as given, so tests can exercise non-canonical casing.
    pub fn add_user(&self, name: &str, email: &str, password: &str, role: &str) -> String {
        let mut data = self.state.lock();
        create_account(&mut data, name, email, password, Some(role), None)
    }

    /// Add a notification and return its id.
    pub fn add_notification(&self, title: &str, read: bool) -> String {
        let mut data = self.state.lock();
        data.next_id += 1;
        let id = format!("n{}", data.next_id);
        let created_at = format!("2026-10-01T12:{:02}:00Z", data.next_id % 60);
        // Newest first, like the real endpoint.
        data.notifications.insert(
            0,
            json!({
                "_id": id,
                "type": "new_order",
                "title": title,
                "message": format!("{title} (details)"),
                "isRead": read,
                "createdAt": created_at,
            }),
        );
        id
    }

    /// Server-side read flag of a notification, `None` if it does not exist.
    #[must_use]
    pub fn notification_read(&self, id: &str) -> Option<bool> {
        self.state
            .lock()
            .notifications
            .iter()
            .find(|n| n["_id"] == id)
            .and_then(|n| n["isRead"].as_bool())
    }

    /// Number of notifications held by the server.
    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.state.lock().notifications.len()
    }

    /// Make every notification mutation answer 500.
    pub fn fail_mutations(&self, fail: bool) {
        self.state.lock().fail_mutations = fail;
    }

    /// Every request seen so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests whose path ends with `suffix`.
    #[must_use]
    pub fn requests_to(&self, suffix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Router
// =============================================================================

fn router(state: Arc<FakeState>) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/mark-all-read", patch(mark_all_read))
        .route("/notifications/all", delete(delete_all))
        .route("/notifications/{id}", delete(delete_one))
        .route("/notifications/{id}/read", patch(mark_read));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Arc<FakeState>>, request: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: header_value(request.headers(), header::AUTHORIZATION.as_str()),
        session_id: header_value(request.headers(), SESSION_ID_HEADER),
    };
    state.lock().requests.push(recorded);
    next.run(request).await
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the bearer token to an account.
fn authenticate(data: &Data, headers: &HeaderMap) -> Result<Account, Response> {
    let token = bearer(headers)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Not authorized, no token"))?;
    data.accounts
        .iter()
        .find(|a| a.token == token)
        .cloned()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Not authorized, token failed"))
}

fn require_admin(data: &Data, headers: &HeaderMap) -> Result<(), Response> {
    let account = authenticate(data, headers)?;
    let is_admin = account.user["role"]
        .as_str()
        .is_some_and(|r| r.eq_ignore_ascii_case("admin"));
    if is_admin {
        Ok(())
    } else {
        Err(failure(StatusCode::FORBIDDEN, "Admin access required"))
    }
}

fn create_account(
    data: &mut Data,
    name: &str,
    email: &str,
    password: &str,
    role: Option<&str>,
    phone: Option<&str>,
) -> String {
    data.next_id += 1;
    let token = format!("token-{}", data.next_id);
    let mut user = json!({
        "_id": format!("u{}", data.next_id),
        "name": name,
        "email": email,
        "role": role.unwrap_or("buyer"),
    });
    if let Some(phone) = phone {
        user["phone"] = json!(phone);
    }
    data.accounts.push(Account {
        user,
        password: password.to_string(),
        token: token.clone(),
    });
    token
}

fn unread(data: &Data) -> usize {
    data.notifications
        .iter()
        .filter(|n| n["isRead"] == false)
        .count()
}

// =============================================================================
// Auth handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<FakeState>>, Json(body): Json<LoginBody>) -> Response {
    let data = state.lock();
    let account = data.accounts.iter().find(|a| {
        a.user["email"]
            .as_str()
            .is_some_and(|e| e.eq_ignore_ascii_case(&body.email))
            && a.password == body.password
    });

    match account {
        Some(account) => Json(json!({
            "success": true,
            "token": account.token,
            "user": account.user,
        }))
        .into_response(),
        None => failure(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    role: Option<String>,
}

async fn register(State(state): State<Arc<FakeState>>, Json(body): Json<RegisterBody>) -> Response {
    let mut data = state.lock();
    let taken = data.accounts.iter().any(|a| {
        a.user["email"]
            .as_str()
            .is_some_and(|e| e.eq_ignore_ascii_case(&body.email))
    });
    if taken {
        return failure(StatusCode::BAD_REQUEST, "User already exists");
    }

    // Self-service registration may not create administrators.
    let role = body
        .role
        .as_deref()
        .filter(|r| !r.eq_ignore_ascii_case("admin"))
        .map(str::to_lowercase);
    let token = create_account(
        &mut data,
        &body.name,
        &body.email,
        &body.password,
        role.as_deref(),
        body.phone.as_deref(),
    );
    let user = data
        .accounts
        .last()
        .map(|a| a.user.clone())
        .unwrap_or_default();

    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token, "user": user })),
    )
        .into_response()
}

async fn me(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let data = state.lock();
    match authenticate(&data, &headers) {
        Ok(account) => Json(json!({ "success": true, "user": account.user })).into_response(),
        Err(rejection) => rejection,
    }
}

// =============================================================================
// Notification handlers
// =============================================================================

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

async fn list_notifications(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let data = state.lock();
    if let Err(rejection) = require_admin(&data, &headers) {
        return rejection;
    }
    let limit = query.limit.unwrap_or(20);
    let page: Vec<Value> = data.notifications.iter().take(limit).cloned().collect();
    Json(json!({
        "success": true,
        "data": page,
        "unreadCount": unread(&data),
    }))
    .into_response()
}

async fn unread_count(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let data = state.lock();
    if let Err(rejection) = require_admin(&data, &headers) {
        return rejection;
    }
    Json(json!({ "success": true, "count": unread(&data) })).into_response()
}

/// Common preamble for mutations: admin check and the failure switch.
fn mutation_guard(data: &Data, headers: &HeaderMap) -> Result<(), Response> {
    require_admin(data, headers)?;
    if data.fail_mutations {
        return Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "Server error"));
    }
    Ok(())
}

async fn mark_read(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut data = state.lock();
    if let Err(rejection) = mutation_guard(&data, &headers) {
        return rejection;
    }
    match data.notifications.iter_mut().find(|n| n["_id"] == id.as_str()) {
        Some(notification) => {
            notification["isRead"] = json!(true);
            Json(json!({ "success": true })).into_response()
        }
        None => failure(StatusCode::NOT_FOUND, "Notification not found"),
    }
}

async fn mark_all_read(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let mut data = state.lock();
    if let Err(rejection) = mutation_guard(&data, &headers) {
        return rejection;
    }
    for notification in &mut data.notifications {
        notification["isRead"] = json!(true);
    }
    Json(json!({ "success": true })).into_response()
}

async fn delete_one(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut data = state.lock();
    if let Err(rejection) = mutation_guard(&data, &headers) {
        return rejection;
    }
    let before = data.notifications.len();
    data.notifications.retain(|n| n["_id"] != id.as_str());
    if data.notifications.len() == before {
        return failure(StatusCode::NOT_FOUND, "Notification not found");
    }
    Json(json!({ "success": true })).into_response()
}

async fn delete_all(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let mut data = state.lock();
    if let Err(rejection) = mutation_guard(&data, &headers) {
        return rejection;
    }
    data.notifications.clear();
    Json(json!({ "success": true })).into_response()
}
