//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! GET  /                          - Landing page
//! GET  /login, POST /login        - Sign in
//! GET  /register, POST /register  - Customer registration
//! POST /logout                    - Sign out
//! GET  /health                    - Health check
//!
//! # Any signed-in user
//! GET  /home                      - Generic landing for staff without a screen
//!
//! # Customer (CUSTOMER)
//! GET  /customer/home             - Menu with category filter
//! GET  /customer/orders           - Order history
//! GET  /customer/booking          - Floor plan (date/time/table in query)
//! POST /customer/booking          - Reserve a table
//! GET  /customer/about|service    - Static pages
//! GET  /customer/contact, POST    - Contact form
//!
//! # Cart (CUSTOMER, HTMX fragments)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add one unit (triggers cart-updated)
//! POST /cart/update               - Change quantity by delta
//! POST /cart/remove               - Remove a line
//! POST /cart/clear                - Empty the cart
//! POST /cart/checkout             - Place the order
//! GET  /cart/count                - Cart badge
//! GET  /api/cart                  - Cart count and total (JSON, 401/403 on refusal)
//!
//! # Admin (ADMIN)
//! GET  /admin/dashboard           - Headline numbers and recent orders
//! GET  /admin/users, POST         - Users list / create
//! POST /admin/users/{id}[/status|/delete]
//! GET  /admin/items, POST         - Items list / create (multipart)
//! POST /admin/items/{id}[/status|/delete]
//! GET  /admin/others, POST        - Categories list / create
//! POST /admin/others/{id}[/status|/delete]
//! GET  /admin/orders              - Orders list and manual order composer
//! POST /admin/orders/{id}/status|/edit
//! *    /admin/orders/compose/*    - Composer actions
//! GET  /admin/bookings            - Bookings with status filter
//! POST /admin/bookings/{id}/status|/delete
//! GET  /admin/settings, POST      - Profile settings
//!
//! # Barista (BARISTOR)
//! GET  /baristor/dashboard        - Active order board
//! GET  /baristor/orders           - Board fragment (polled)
//! POST /baristor/orders/{id}/status
//! ```

pub mod admin;
pub mod auth;
pub mod barista;
pub mod cart;
pub mod customer;
pub mod home;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use aromista_core::guard::LOGIN_PATH;
use aromista_core::{AuthenticatedUser, Role};

use crate::api::ApiError;
use crate::middleware::sign_out;
use crate::models::{Notice, push_notice, take_notice};
use crate::state::AppState;

// =============================================================================
// Layout
// =============================================================================

/// Data the shared page layout needs: navigation, toast and cart badge.
#[derive(Debug, Clone)]
pub struct Layout {
    pub user: Option<AuthenticatedUser>,
    pub notice: Option<Notice>,
    pub cart_count: u32,
    pub current_path: &'static str,
}

impl Layout {
    /// Build the layout for a page, consuming the pending notice.
    pub async fn load(
        session: &Session,
        user: Option<&AuthenticatedUser>,
        current_path: &'static str,
    ) -> Self {
        let cart_count = match user {
            Some(user) if user.has_role(&Role::Customer) => {
                cart::load_cart(session).await.item_count()
            }
            _ => 0,
        };

        Self {
            user: user.cloned(),
            notice: take_notice(session).await,
            cart_count,
            current_path,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }

    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.has_role(&Role::Customer)
    }

    #[must_use]
    pub fn is_barista(&self) -> bool {
        self.has_role(&Role::Barista)
    }

    /// Whether `path` is the current page (for nav highlighting).
    #[must_use]
    pub fn is_current(&self, path: &str) -> bool {
        self.current_path == path
    }

    fn has_role(&self, role: &Role) -> bool {
        self.user.as_ref().is_some_and(|u| u.has_role(role))
    }
}

// =============================================================================
// HTMX
// =============================================================================

/// Whether the request was issued by HTMX (`HX-Request: true`).
///
/// HTMX requests get fragments back; plain form posts get a redirect.
#[derive(Debug, Clone, Copy)]
pub struct HxRequest(pub bool);

impl<S> FromRequestParts<S> for HxRequest
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get("HX-Request")
                .is_some_and(|v| v.as_bytes() == b"true"),
        ))
    }
}

// =============================================================================
// Notice Helpers
// =============================================================================

/// Queue `notice` and redirect to `to`.
pub async fn redirect_with(session: &Session, notice: Notice, to: &str) -> Response {
    push_notice(session, notice).await;
    Redirect::to(to).into_response()
}

/// Report a failed API call as a notice.
///
/// Rejected credentials end the session and send the visitor to the login
/// page; anything else redirects to `to` with `title` and the API's message.
pub async fn api_failure(session: &Session, error: &ApiError, title: &str, to: &str) -> Response {
    if matches!(error, ApiError::Unauthorized) {
        tracing::info!("API rejected session tokens, signing out");
        if let Err(e) = sign_out(session).await {
            tracing::error!("Failed to clear session: {e}");
        }
        return redirect_with(
            session,
            Notice::warning("Session expired").with_text(error.user_message()),
            LOGIN_PATH,
        )
        .await;
    }

    tracing::warn!(error = %error, "{title}");
    redirect_with(session, Notice::error(title).with_text(error.user_message()), to).await
}

// =============================================================================
// Routers
// =============================================================================

/// Create the public and auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(customer::menu))
        .route("/orders", get(customer::orders))
        .route("/booking", get(customer::booking_page).post(customer::book_table))
        .route("/about", get(customer::about))
        .route("/service", get(customer::service))
        .route("/contact", get(customer::contact_page).post(customer::contact))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/checkout", post(cart::checkout))
        .route("/count", get(cart::count))
}

/// Create the barista routes router.
pub fn barista_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(barista::dashboard))
        .route("/orders", get(barista::board))
        .route("/orders/{id}/status", post(barista::update_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/home", get(home::home))
        .route("/api/cart", get(cart::summary))
        .merge(auth_routes())
        .nest("/customer", customer_routes())
        .nest("/cart", cart_routes())
        .nest("/admin", admin::routes())
        .nest("/baristor", barista_routes())
}
