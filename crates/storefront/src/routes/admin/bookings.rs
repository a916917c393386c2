//! Admin reservation ledger: bookings with a status filter and per-status
//! counters.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::stats::BookingCounts;
use aromista_core::{BookingId, BookingStatus};

use crate::api::{ApiError, Booking};
use crate::filters;
use crate::middleware::{RequireAdmin, RequireRole};
use crate::models::Notice;
use crate::routes::{Layout, api_failure, redirect_with};
use crate::state::AppState;

const PATH: &str = "/admin/bookings";

/// Bookings query parameters. `ALL` or nothing shows every booking.
#[derive(Debug, Default, Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
}

/// Bookings page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/bookings.html")]
pub struct BookingsTemplate {
    pub layout: Layout,
    pub bookings: Vec<Booking>,
    pub counts: BookingCounts,
    pub total: usize,
    pub filter: Option<BookingStatus>,
    pub statuses: &'static [BookingStatus],
}

impl BookingsTemplate {
    #[must_use]
    pub fn is_filter(&self, status: &BookingStatus) -> bool {
        self.filter.as_ref() == Some(status)
    }
}

/// Keep the bookings with `status`, or all of them.
#[must_use]
pub fn filter_bookings(bookings: Vec<Booking>, status: Option<BookingStatus>) -> Vec<Booking> {
    match status {
        Some(status) => bookings.into_iter().filter(|b| b.status == status).collect(),
        None => bookings,
    }
}

/// Display the bookings.
///
/// Counters are computed over every booking, before the filter applies.
#[instrument(skip(state, session, me))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Query(query): Query<BookingsQuery>,
) -> Response {
    let bookings = match state.api().all_bookings(&me.credentials).await {
        Ok(bookings) => bookings,
        Err(e) => {
            return api_failure(&session, &e, "Could not load bookings", "/admin/dashboard").await;
        }
    };

    let counts: BookingCounts = bookings.iter().map(|b| b.status).collect();
    let total = bookings.len();
    let filter = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<BookingStatus>().ok());

    BookingsTemplate {
        layout: Layout::load(&session, Some(&me.user), PATH).await,
        bookings: filter_bookings(bookings, filter),
        counts,
        total,
        filter,
        statuses: BookingStatus::ALL,
    }
    .into_response()
}

/// Status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Confirm or cancel a booking.
#[instrument(skip(state, session, me))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let Ok(status) = form.status.parse::<BookingStatus>() else {
        return redirect_with(&session, Notice::error("Update Failed").with_text("Unknown status"), PATH)
            .await;
    };

    match state
        .api()
        .update_booking_status(&me.credentials, &BookingId::new(id), status)
        .await
    {
        Ok(()) => redirect_with(&session, Notice::success(format!("Booking {status}")), PATH).await,
        Err(e @ ApiError::Unauthorized) => api_failure(&session, &e, "Update Failed", PATH).await,
        Err(e) => {
            tracing::warn!(error = %e, "Booking status update failed");
            let notice = match &e {
                ApiError::Status { message, .. } => Notice::error("Update Failed").with_text(message.clone()),
                _ => Notice::error("Update Failed"),
            };
            redirect_with(&session, notice, PATH).await
        }
    }
}

/// Delete a booking.
#[instrument(skip(state, session, me))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .delete_booking(&me.credentials, &BookingId::new(id))
        .await
    {
        Ok(()) => redirect_with(&session, Notice::success("Deleted!"), PATH).await,
        Err(e) => api_failure(&session, &e, "Delete Failed", PATH).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(id),
            user: None,
            table_number: "I3".to_string(),
            booking_date: "2026-02-14T00:00:00.000Z".to_string(),
            booking_time: "19:00".to_string(),
            status,
        }
    }

    #[test]
    fn test_filter_bookings() {
        let all = vec![
            booking("b1", BookingStatus::Pending),
            booking("b2", BookingStatus::Confirmed),
            booking("b3", BookingStatus::Pending),
        ];

        assert_eq!(filter_bookings(all.clone(), None).len(), 3);
        let pending: Vec<_> = filter_bookings(all, Some(BookingStatus::Pending))
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(pending, [BookingId::new("b1"), BookingId::new("b3")]);
    }
}
