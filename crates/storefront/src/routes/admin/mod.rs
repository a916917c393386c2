//! Back-office screens for the `ADMIN` role.
//!
//! Every handler here takes [`RequireAdmin`](crate::middleware::RequireAdmin).
//! Mutations are plain form posts that redirect back to the list they came
//! from with a notice.

pub mod bookings;
pub mod dashboard;
pub mod items;
pub mod orders;
pub mod others;
pub mod settings;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router (nested under `/admin`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to(dashboard::PATH) }))
        .route("/dashboard", get(dashboard::show))
        // Users
        .route("/users", get(users::index).post(users::create))
        .route("/users/{id}", post(users::update))
        .route("/users/{id}/status", post(users::toggle_status))
        .route("/users/{id}/delete", post(users::delete))
        // Items
        .route(
            "/items",
            get(items::index)
                .post(items::create)
                .layer(DefaultBodyLimit::max(items::MAX_UPLOAD_BYTES)),
        )
        .route(
            "/items/{id}",
            post(items::update).layer(DefaultBodyLimit::max(items::MAX_UPLOAD_BYTES)),
        )
        .route("/items/{id}/status", post(items::toggle_status))
        .route("/items/{id}/delete", post(items::delete))
        // Categories
        .route("/others", get(others::index).post(others::create))
        .route("/others/{id}", post(others::rename))
        .route("/others/{id}/status", post(others::toggle_status))
        .route("/others/{id}/delete", post(others::delete))
        // Orders and the manual order composer
        .route("/orders", get(orders::index))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/orders/{id}/edit", post(orders::edit))
        .route("/orders/compose/users", get(orders::search_users))
        .route("/orders/compose/user", post(orders::pick_user))
        .route("/orders/compose/add", post(orders::add_line))
        .route("/orders/compose/update", post(orders::update_line))
        .route("/orders/compose/remove", post(orders::remove_line))
        .route("/orders/compose/reset", post(orders::reset))
        .route("/orders/compose/submit", post(orders::submit))
        // Bookings
        .route("/bookings", get(bookings::index))
        .route("/bookings/{id}/status", post(bookings::update_status))
        .route("/bookings/{id}/delete", post(bookings::delete))
        // Settings
        .route("/settings", get(settings::show).post(settings::save))
}
