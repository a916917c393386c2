//! End-to-end test harness for the Aromista storefront.
//!
//! [`FakeApi`] serves the slice of the Aromista REST API the storefront
//! talks to, from memory, and records what it receives. [`Storefront`] runs
//! the real storefront router against it on an ephemeral port and drives it
//! with a cookie-keeping `reqwest` client, the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aromista-integration-tests
//! ```
//!
//! Nothing external is needed: both servers bind to `127.0.0.1:0`.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use reqwest::redirect::Policy;
use serde_json::{Value, json};
use url::Url;

use aromista_storefront::config::StorefrontConfig;
use aromista_storefront::state::AppState;

// =============================================================================
// Fixtures
// =============================================================================

/// A sign-in the fake API accepts.
#[derive(Debug, Clone, Copy)]
pub struct Account {
    pub id: &'static str,
    pub fullname: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub role: &'static str,
}

pub const CUSTOMER: Account = Account {
    id: "u-customer",
    fullname: "Nimali Perera",
    email: "nimali@aromista.lk",
    password: "flat-white-42",
    role: "CUSTOMER",
};

pub const ADMIN: Account = Account {
    id: "u-admin",
    fullname: "Ruwan Silva",
    email: "ruwan@aromista.lk",
    password: "espresso-admin",
    role: "ADMIN",
};

pub const BARISTA: Account = Account {
    id: "u-barista",
    fullname: "Kasun Fernando",
    email: "kasun@aromista.lk",
    password: "milk-steamer",
    role: "BARISTOR",
};

const ACCOUNTS: [Account; 3] = [CUSTOMER, ADMIN, BARISTA];

/// Menu item ids served by the fake API.
pub const LATTE: &str = "item-latte";
pub const FLAT_WHITE: &str = "item-flat-white";

/// An order already on file, for the admin edit flow.
pub const SEEDED_ORDER: &str = "order-seed";

fn menu() -> Value {
    json!([
        {
            "_id": LATTE,
            "name": "Caramel Latte",
            "description": "Double shot, steamed milk, house caramel",
            "price": 850,
            "category": "Coffee",
            "availability": "AVAILABLE"
        },
        {
            "_id": FLAT_WHITE,
            "name": "Flat White",
            "description": "Ristretto and microfoam",
            "price": 900,
            "category": "Coffee",
            "availability": "UNAVAILABLE"
        }
    ])
}

// =============================================================================
// Fake REST API
// =============================================================================

#[derive(Default)]
struct ApiState {
    /// Live access tokens and the account they belong to.
    access_tokens: Mutex<HashMap<String, Account>>,
    refresh_tokens: Mutex<HashMap<String, Account>>,
    issued: AtomicUsize,
    refresh_calls: AtomicUsize,
    placed_orders: Mutex<Vec<Value>>,
    staff_orders: Mutex<Vec<StaffOrderCall>>,
    bookings: Mutex<Vec<Value>>,
    deleted_users: Mutex<Vec<String>>,
}

/// A body received by `/orders/create-admin` or `/orders/update-order/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffOrderCall {
    /// `None` for a new order, the order id for an update.
    pub updated: Option<String>,
    pub body: Value,
}

impl ApiState {
    fn issue(&self, account: Account) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let token = format!("access-{}-{n}", account.id);
        self.access_tokens
            .lock()
            .unwrap()
            .insert(token.clone(), account);
        token
    }

    fn caller(&self, headers: &HeaderMap) -> Option<Account> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.access_tokens.lock().unwrap().get(token).copied()
    }
}

/// A populated `userId` reference.
fn user_ref(account: Account) -> Value {
    json!({ "_id": account.id, "fullname": account.fullname, "email": account.email })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "jwt expired" })),
    )
        .into_response()
}

/// In-memory stand-in for the Aromista REST API.
pub struct FakeApi {
    state: Arc<ApiState>,
    base_url: Url,
}

impl FakeApi {
    /// Start the fake API on an ephemeral port.
    pub async fn spawn() -> Self {
        let state = Arc::new(ApiState::default());
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/auth/refresh", post(refresh))
            .route("/items/customer/getall", get(customer_items))
            .route("/categories/getall", get(categories))
            .route("/orders/create", post(create_order))
            .route("/orders/getall/orders/foruser", get(my_orders))
            .route("/orders/barista/getall", get(barista_orders))
            .route("/orders/getall", get(all_orders))
            .route("/orders/search-user", get(search_users))
            .route("/orders/create-admin", post(create_staff_order))
            .route("/orders/update-order/{id}", put(update_order))
            .route("/items/getall", get(all_items))
            .route("/auth/getall", get(list_users))
            .route("/auth/delete/{id}", delete(delete_user))
            .route("/bookings/create", post(create_booking))
            .route("/bookings/booked-tables", get(booked_tables))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest("/api/v1", api);

        let addr = serve(app).await;
        let base_url = Url::parse(&format!("http://{addr}/api/v1")).unwrap();
        Self { state, base_url }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Forget every access token, as if they had all expired. Refresh tokens
    /// keep working.
    pub fn expire_access_tokens(&self) {
        self.state.access_tokens.lock().unwrap().clear();
    }

    /// Forget every token.
    pub fn revoke_all_tokens(&self) {
        self.expire_access_tokens();
        self.state.refresh_tokens.lock().unwrap().clear();
    }

    /// How many times `/auth/refresh` has been called.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    /// Bodies received by `/orders/create`.
    #[must_use]
    pub fn placed_orders(&self) -> Vec<Value> {
        self.state.placed_orders.lock().unwrap().clone()
    }

    /// Orders created or rewritten from the admin composer.
    #[must_use]
    pub fn staff_orders(&self) -> Vec<StaffOrderCall> {
        self.state.staff_orders.lock().unwrap().clone()
    }

    /// Bodies received by `/bookings/create`.
    #[must_use]
    pub fn bookings(&self) -> Vec<Value> {
        self.state.bookings.lock().unwrap().clone()
    }

    /// Ids received by `/auth/delete/{id}`.
    #[must_use]
    pub fn deleted_users(&self) -> Vec<String> {
        self.state.deleted_users.lock().unwrap().clone()
    }
}

async fn login(State(state): State<Arc<ApiState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let Some(account) = ACCOUNTS
        .iter()
        .find(|a| a.email == email && a.password == password)
        .copied()
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response();
    };

    let access = state.issue(account);
    let refresh = format!("refresh-{}", account.id);
    state
        .refresh_tokens
        .lock()
        .unwrap()
        .insert(refresh.clone(), account);

    Json(json!({
        "message": "Login successful",
        "data": { "accessToken": access, "refreshToken": refresh }
    }))
    .into_response()
}

async fn me(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    let Some(account) = state.caller(&headers) else {
        return unauthorized();
    };
    Json(json!({
        "data": {
            "_id": account.id,
            "fullname": account.fullname,
            "email": account.email,
            "roles": [account.role]
        }
    }))
    .into_response()
}

async fn refresh(State(state): State<Arc<ApiState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let token = body["token"].as_str().unwrap_or_default();
    let account = state.refresh_tokens.lock().unwrap().get(token).copied();

    match account {
        Some(account) => Json(json!({ "accessToken": state.issue(account) })).into_response(),
        None => (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "Invalid refresh token" })),
        )
            .into_response(),
    }
}

async fn customer_items(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "items": menu() })).into_response()
}

async fn categories(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({
        "categories": [{ "_id": "cat-coffee", "categoryName": "Coffee", "status": "AVAILABLE" }]
    }))
    .into_response()
}

async fn create_order(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    state.placed_orders.lock().unwrap().push(body);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Order placed" })),
    )
        .into_response()
}

async fn my_orders(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    let Some(account) = state.caller(&headers) else {
        return unauthorized();
    };

    let orders: Vec<Value> = state
        .placed_orders
        .lock()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(n, body)| {
            json!({
                "_id": format!("order-{n:06}"),
                "userId": { "_id": account.id, "fullname": account.fullname, "email": account.email },
                "items": body["items"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|line| json!({
                        "item": { "_id": line["item"], "name": "Caramel Latte" },
                        "quantity": line["quantity"],
                        "unitPrice": 850
                    }))
                    .collect::<Vec<_>>(),
                "totalAmount": 1700,
                "status": "PENDING",
                "createdAt": "2026-10-19T08:30:00.000Z"
            })
        })
        .collect();

    Json(json!({ "orders": orders })).into_response()
}

async fn all_orders(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({
        "orders": [{
            "_id": SEEDED_ORDER,
            "userId": user_ref(CUSTOMER),
            "items": [{
                "item": { "_id": LATTE, "name": "Caramel Latte" },
                "quantity": 1,
                "unitPrice": 800
            }],
            "totalAmount": 800,
            "status": "PENDING",
            "createdAt": "2026-10-18T07:15:00.000Z"
        }]
    }))
    .into_response()
}

async fn search_users(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let query = params.get("query").map(|q| q.to_lowercase()).unwrap_or_default();
    let users: Vec<Value> = ACCOUNTS
        .iter()
        .filter(|a| a.role == "CUSTOMER")
        .filter(|a| a.fullname.to_lowercase().contains(&query) || a.email.contains(&query))
        .map(|a| user_ref(*a))
        .collect();
    Json(json!({ "users": users })).into_response()
}

async fn create_staff_order(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    state
        .staff_orders
        .lock()
        .unwrap()
        .push(StaffOrderCall { updated: None, body });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Order created" })),
    )
        .into_response()
}

async fn update_order(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    state.staff_orders.lock().unwrap().push(StaffOrderCall {
        updated: Some(id),
        body,
    });
    Json(json!({ "message": "Order updated" })).into_response()
}

async fn all_items(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "items": menu() })).into_response()
}

async fn list_users(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let users: Vec<Value> = ACCOUNTS
        .iter()
        .map(|a| {
            json!({
                "_id": a.id,
                "fullname": a.fullname,
                "email": a.email,
                "roles": [a.role],
                "approved": "ACTIVE"
            })
        })
        .collect();
    Json(json!({
        "data": users,
        "pagination": { "page": 1, "pages": 1, "total": ACCOUNTS.len() },
        "stats": { "all": ACCOUNTS.len(), "customerCount": 1, "staffCount": 2 }
    }))
    .into_response()
}

async fn delete_user(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    state.deleted_users.lock().unwrap().push(id);
    Json(json!({ "message": "User deleted" })).into_response()
}

async fn create_booking(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    state.bookings.lock().unwrap().push(body);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Table booked" })),
    )
        .into_response()
}

async fn booked_tables(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let booked: Vec<Value> = state
        .bookings
        .lock()
        .unwrap()
        .iter()
        .filter(|b| {
            params.get("date").map(String::as_str) == b["bookingDate"].as_str()
                && params.get("time").map(String::as_str) == b["bookingTime"].as_str()
        })
        .map(|b| b["tableNumber"].clone())
        .collect();
    Json(json!({ "bookedTableIds": booked })).into_response()
}

async fn barista_orders(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "orders": [] })).into_response()
}

// =============================================================================
// Storefront
// =============================================================================

/// A running storefront and a browser-like client for it.
///
/// The client keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
pub struct Storefront {
    base_url: String,
    client: reqwest::Client,
}

impl Storefront {
    /// Start a storefront that calls `api`.
    pub async fn spawn(api: &FakeApi) -> Self {
        let config = StorefrontConfig::local(api.base_url().clone());
        let state = AppState::new(config).expect("storefront state");
        let addr = serve(aromista_storefront::app(state)).await;

        Self {
            base_url: format!("http://{addr}"),
            client: new_client(),
        }
    }

    /// Another visitor with an empty cookie jar.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: new_client(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("GET")
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST")
    }

    /// A `GET` as HTMX sends it.
    pub async fn hx_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("HTMX GET")
    }

    /// The cart summary from `/api/cart`.
    pub async fn cart_summary(&self) -> Value {
        let response = self.get("/api/cart").await;
        assert_eq!(response.status(), StatusCode::OK, "/api/cart");
        response.json().await.expect("cart summary")
    }

    /// A form post as HTMX sends it.
    pub async fn hx_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("HTMX POST")
    }

    /// Sign in through the login form.
    pub async fn sign_in(&self, account: Account) -> reqwest::Response {
        self.post(
            "/login",
            &[("email", account.email), ("password", account.password)],
        )
        .await
    }
}

fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("HTTP client")
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)?
        .to_str()
        .ok()
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}
