//! Admin dashboard: headline numbers and the latest orders.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::stats::DashboardStats;

use crate::api::{ApiError, Order, UserFilter};
use crate::filters;
use crate::middleware::{RequireAdmin, RequireRole};
use crate::routes::{Layout, api_failure};
use crate::state::AppState;

pub const PATH: &str = "/admin/dashboard";

/// Orders listed under "Recent orders".
pub const RECENT_ORDERS: usize = 5;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
}

/// The newest `RECENT_ORDERS` orders.
fn recent(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders.truncate(RECENT_ORDERS);
    orders
}

/// Display the dashboard.
///
/// Orders, users and items are fetched concurrently. Only a rejected session
/// leaves the page; other failures show zeros and a notice.
#[instrument(skip(state, session, me))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
) -> Response {
    let users_filter = UserFilter {
        page: 1,
        limit: 1,
        ..UserFilter::default()
    };
    let (orders, users, items) = tokio::join!(
        state.api().all_orders(&me.credentials),
        state.api().list_users(&me.credentials, &users_filter),
        state.api().admin_items(&me.credentials),
    );

    let failure = [orders.as_ref().err(), users.as_ref().err(), items.as_ref().err()]
        .into_iter()
        .flatten()
        .next();
    if let Some(error @ ApiError::Unauthorized) = failure {
        return api_failure(&session, error, "Dashboard unavailable", PATH).await;
    }

    let orders = orders.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load orders for dashboard");
        Vec::new()
    });
    let total_users = users.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load users for dashboard");
            0
        },
        |page| page.pagination.total,
    );
    let total_items = items.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load items for dashboard");
            0
        },
        |items| items.len(),
    );

    let stats = DashboardStats::from_orders(
        orders.iter().map(|o| (o.status, o.total_amount)),
        total_items,
        total_users,
    );

    DashboardTemplate {
        layout: Layout::load(&session, Some(&me.user), PATH).await,
        stats,
        recent_orders: recent(orders),
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aromista_core::{Money, OrderId, OrderStatus};
    use chrono::{TimeZone, Utc};

    use super::*;

    fn order(id: &str, hour: u32) -> Order {
        Order {
            id: OrderId::new(id),
            user: None,
            items: Vec::new(),
            total_amount: Money::from_rupees(500),
            status: OrderStatus::Pending,
            created_at: Some(Utc.with_ymd_and_hms(2026, 1, 5, hour, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_recent_keeps_newest_five() {
        let orders = (1..=7).map(|h| order(&format!("o{h}"), h)).collect();
        let ids: Vec<_> = recent(orders)
            .into_iter()
            .map(|o| o.id.as_str().to_string())
            .collect();
        assert_eq!(ids, ["o7", "o6", "o5", "o4", "o3"]);
    }
}
