//! Barista order board.
//!
//! The board lists the orders still to be made (`PENDING` or `PROCESSING`),
//! oldest first. The page re-polls the board fragment every
//! `AROMISTA_BARISTA_POLL_SECS`; each poll sends back how many orders it was
//! showing so the fragment can flag a new arrival.

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

use aromista_core::stats::new_order_arrived;
use aromista_core::{OrderId, OrderStatus};

use super::{Layout, api_failure, redirect_with};
use crate::api::{ApiError, Order};
use crate::filters;
use crate::middleware::{RequireBarista, RequireRole};
use crate::models::Notice;
use crate::state::AppState;

const DASHBOARD_PATH: &str = "/baristor/dashboard";

/// The active-order board (page section and polled fragment).
#[derive(Debug, Clone)]
pub struct Board {
    pub orders: Vec<Order>,
    /// Whether more orders are active than the previous poll showed.
    pub new_order: bool,
    pub poll_secs: u64,
}

impl Board {
    /// Build the board from the API's list, given how many orders the
    /// previous render showed.
    #[must_use]
    pub fn new(orders: Vec<Order>, previously_shown: usize, poll_secs: u64) -> Self {
        let mut orders: Vec<Order> = orders
            .into_iter()
            .filter(|o| o.status.is_active())
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Self {
            new_order: new_order_arrived(previously_shown, orders.len()),
            orders,
            poll_secs,
        }
    }
}

/// Barista dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "barista/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub board: Board,
}

/// Board fragment template (for HTMX polling).
#[derive(Template, WebTemplate)]
#[template(path = "partials/barista_board.html")]
pub struct BoardTemplate {
    pub board: Board,
}

/// Board poll query: the number of orders the page was showing.
#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    #[serde(default)]
    pub seen: usize,
}

fn poll_secs(state: &AppState) -> u64 {
    state.config().barista_poll.as_secs().max(1)
}

/// Display the barista dashboard.
#[instrument(skip(state, session, me))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireBarista,
) -> Response {
    let orders = match state.api().barista_orders(&me.credentials).await {
        Ok(orders) => orders,
        Err(e @ ApiError::Unauthorized) => {
            return api_failure(&session, &e, "Could not load orders", DASHBOARD_PATH).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load barista orders");
            Vec::new()
        }
    };

    DashboardTemplate {
        layout: Layout::load(&session, Some(&me.user), DASHBOARD_PATH).await,
        board: Board::new(orders, 0, poll_secs(&state)),
    }
    .into_response()
}

/// The board fragment, polled by the dashboard.
///
/// A failed poll keeps the previous board on screen by answering with
/// `204 No Content`.
#[instrument(skip(state, me))]
pub async fn board(
    State(state): State<AppState>,
    RequireRole(me, _): RequireBarista,
    Query(query): Query<BoardQuery>,
) -> Response {
    match state.api().barista_orders(&me.credentials).await {
        Ok(orders) => BoardTemplate {
            board: Board::new(orders, query.seen, poll_secs(&state)),
        }
        .into_response(),
        Err(ApiError::Unauthorized) => ([("HX-Redirect", "/login")], "").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Board poll failed");
            axum::http::StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Start, complete or cancel an order.
#[instrument(skip(state, session, me))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireBarista,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        return redirect_with(&session, Notice::error("Update Failed"), DASHBOARD_PATH).await;
    };

    match state
        .api()
        .update_order_status(&me.credentials, &OrderId::new(id), status)
        .await
    {
        Ok(()) => {
            redirect_with(
                &session,
                Notice::success(format!("Order set to {status}")),
                DASHBOARD_PATH,
            )
            .await
        }
        Err(e) => api_failure(&session, &e, "Update Failed", DASHBOARD_PATH).await,
    }
}

#[cfg(test)]
mod tests {
    use aromista_core::Money;

    use super::*;

    fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(id),
            user: None,
            items: Vec::new(),
            total_amount: Money::from_rupees(650),
            status,
            created_at: None,
        }
    }

    #[test]
    fn test_board_shows_active_orders_only() {
        let board = Board::new(
            vec![
                order("a", OrderStatus::Pending),
                order("b", OrderStatus::Completed),
                order("c", OrderStatus::Processing),
                order("d", OrderStatus::Cancelled),
            ],
            0,
            20,
        );
        assert_eq!(board.orders.len(), 2);
        assert!(!board.new_order);
    }

    #[test]
    fn test_board_flags_growth_since_last_poll() {
        let orders = vec![order("a", OrderStatus::Pending), order("b", OrderStatus::Pending)];
        assert!(Board::new(orders.clone(), 1, 20).new_order);
        assert!(!Board::new(orders.clone(), 2, 20).new_order);
        assert!(!Board::new(orders, 0, 20).new_order);
    }
}
