//! Admin orders: the order list with status actions and the manual order
//! composer.
//!
//! The composer is a second cart kept in the admin's session under its own
//! key. It remembers the customer the order is for and, when an existing
//! order is being edited, that order's id. Lines carry the unit price shown
//! to the admin, which is what gets posted.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::guard::LOGIN_PATH;
use aromista_core::{Cart, CartLine, ItemId, OrderId, OrderStatus, UserId};

use crate::api::{ApiError, MenuItem, Order, StaffOrder, UserRef};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, RequireRole};
use crate::models::{Notice, session_keys};
use crate::routes::{HxRequest, Layout, api_failure, redirect_with};
use crate::state::AppState;

const PATH: &str = "/admin/orders";
const COMPOSER_PATH: &str = "/admin/orders?compose=1";

// =============================================================================
// Composer State
// =============================================================================

/// The manual order being put together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composer {
    pub user: Option<UserRef>,
    /// Set when an existing order is being edited.
    pub editing: Option<OrderId>,
    pub cart: Cart,
}

impl Composer {
    /// Load an existing order into the composer. Lines whose item has been
    /// deleted cannot be re-posted and are left out.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        let cart = order
            .items
            .iter()
            .filter_map(|line| {
                let item = line.item.as_ref()?;
                Some(CartLine {
                    item_id: item.id.clone(),
                    name: item.name.clone(),
                    price: line.unit_price,
                    image_url: item.image_url.clone(),
                    quantity: line.quantity,
                })
            })
            .collect();

        Self {
            user: order.user.clone(),
            editing: Some(order.id.clone()),
            cart,
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.user.is_none() && self.editing.is_none() && self.cart.is_empty()
    }

    /// The body to post, or `None` without a customer or lines.
    #[must_use]
    pub fn staff_order(&self) -> Option<StaffOrder> {
        let user = self.user.as_ref()?;
        if self.cart.is_empty() {
            return None;
        }
        Some(StaffOrder {
            user_id: user.id.clone(),
            items: self.cart.priced_order_lines(),
            total_amount: self.cart.total_amount(),
        })
    }
}

async fn load_composer(session: &Session) -> Composer {
    match session.get::<Composer>(session_keys::COMPOSER).await {
        Ok(composer) => composer.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read order composer from session: {e}");
            Composer::default()
        }
    }
}

async fn save_composer(session: &Session, composer: &Composer) {
    if let Err(e) = session.insert(session_keys::COMPOSER, composer).await {
        tracing::error!("Failed to save order composer to session: {e}");
    }
}

async fn clear_composer(session: &Session) {
    if let Err(e) = session.remove::<Composer>(session_keys::COMPOSER).await {
        tracing::warn!("Failed to clear order composer: {e}");
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Menu items under one category heading in the composer.
#[derive(Debug, Clone)]
pub struct ItemGroup {
    pub category: String,
    pub items: Vec<MenuItem>,
}

/// Group items by category, keeping the order categories first appear in.
#[must_use]
pub fn group_by_category(items: Vec<MenuItem>) -> Vec<ItemGroup> {
    let mut groups: Vec<ItemGroup> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|g| g.category == item.category) {
            Some(group) => group.items.push(item),
            None => groups.push(ItemGroup {
                category: item.category.clone(),
                items: vec![item],
            }),
        }
    }
    groups
}

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<Order>,
    pub statuses: &'static [OrderStatus],
    /// Whether the composer panel is shown.
    pub composing: bool,
    pub composer: Composer,
    pub groups: Vec<ItemGroup>,
    pub query: String,
    pub found_users: Vec<UserRef>,
}

/// Composer cart fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/composer.html")]
pub struct ComposerTemplate {
    pub composer: Composer,
}

/// User search results fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/user_results.html")]
pub struct UserResultsTemplate {
    pub users: Vec<UserRef>,
    pub query: String,
}

/// Answer a composer change: the fragment for HTMX, a redirect otherwise.
fn composer_changed(hx: HxRequest, composer: Composer) -> Response {
    if hx.0 {
        ComposerTemplate { composer }.into_response()
    } else {
        Redirect::to(COMPOSER_PATH).into_response()
    }
}

// =============================================================================
// Order List
// =============================================================================

/// Orders page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// Open the composer.
    pub compose: Option<String>,
    /// User search text for the composer.
    pub q: Option<String>,
}

/// Display every order, newest first, and the composer when open.
#[instrument(skip(state, session, me))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let mut orders = match state.api().all_orders(&me.credentials).await {
        Ok(orders) => orders,
        Err(e) => return api_failure(&session, &e, "Could not load orders", "/admin/dashboard").await,
    };
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let composer = load_composer(&session).await;
    let search = query.q.unwrap_or_default();
    let composing = query.compose.is_some() || !search.is_empty() || !composer.is_blank();

    let (groups, found_users) = if composing {
        let (items, users) = tokio::join!(
            state.api().all_items(&me.credentials),
            state.api().search_users(&me.credentials, &search),
        );
        let groups = items.map_or_else(
            |e| {
                tracing::warn!(error = %e, "Failed to load items for composer");
                Vec::new()
            },
            group_by_category,
        );
        let users = users.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "User search failed");
            Vec::new()
        });
        (groups, users)
    } else {
        (Vec::new(), Vec::new())
    };

    OrdersTemplate {
        layout: Layout::load(&session, Some(&me.user), PATH).await,
        orders,
        statuses: OrderStatus::ALL,
        composing,
        composer,
        groups,
        query: search,
        found_users,
    }
    .into_response()
}

/// Status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Move an order to another status.
#[instrument(skip(state, session, me))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        return redirect_with(&session, Notice::error("Update Failed").with_text("Unknown status"), PATH)
            .await;
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
                PATH,
            )
            .await
        }
        Err(e) => api_failure(&session, &e, "Update Failed", PATH).await,
    }
}

/// Load an existing order into the composer.
#[instrument(skip(state, session, me))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    let orders = match state.api().all_orders(&me.credentials).await {
        Ok(orders) => orders,
        Err(e) => return api_failure(&session, &e, "Error", PATH).await,
    };

    let Some(order) = orders.iter().find(|o| o.id.as_str() == id) else {
        return redirect_with(
            &session,
            Notice::error("Error").with_text("That order no longer exists."),
            PATH,
        )
        .await;
    };

    save_composer(&session, &Composer::from_order(order)).await;
    Redirect::to(COMPOSER_PATH).into_response()
}

// =============================================================================
// Composer Actions
// =============================================================================

/// User search query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search customers for the composer (HTMX).
#[instrument(skip(state, me, hx))]
pub async fn search_users(
    State(state): State<AppState>,
    hx: HxRequest,
    RequireRole(me, _): RequireAdmin,
    Query(query): Query<SearchQuery>,
) -> Response {
    if !hx.0 {
        let q: String = url::form_urlencoded::byte_serialize(query.q.as_bytes()).collect();
        return Redirect::to(&format!("{COMPOSER_PATH}&q={q}")).into_response();
    }

    match state.api().search_users(&me.credentials, &query.q).await {
        Ok(users) => UserResultsTemplate {
            users,
            query: query.q,
        }
        .into_response(),
        Err(ApiError::Unauthorized) => ([("HX-Redirect", LOGIN_PATH)], "").into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// The customer picked from the search results.
#[derive(Debug, Deserialize)]
pub struct PickUserForm {
    pub id: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
}

/// Set the customer the order is for.
#[instrument(skip(session, _me, hx))]
pub async fn pick_user(
    session: Session,
    hx: HxRequest,
    RequireRole(_me, _): RequireAdmin,
    Form(form): Form<PickUserForm>,
) -> Response {
    let mut composer = load_composer(&session).await;
    composer.user = Some(UserRef {
        id: UserId::new(form.id),
        fullname: form.fullname,
        email: form.email,
    });
    save_composer(&session, &composer).await;
    composer_changed(hx, composer)
}

/// An item in the composer.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub item_id: String,
    #[serde(default)]
    pub delta: i32,
}

/// Add one unit of an item to the composer.
#[instrument(skip(state, session, me, hx))]
pub async fn add_line(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
    RequireRole(me, _): RequireAdmin,
    Form(form): Form<LineForm>,
) -> Response {
    let items = match state.api().all_items(&me.credentials).await {
        Ok(items) => items,
        Err(e) => return api_failure(&session, &e, "Error", COMPOSER_PATH).await,
    };

    let item_id = ItemId::new(form.item_id);
    let mut composer = load_composer(&session).await;
    if let Some(item) = items.iter().find(|item| item.id == item_id) {
        composer.cart.add_item(&item.snapshot());
        save_composer(&session, &composer).await;
    } else {
        tracing::warn!(item_id = %item_id, "Composer add for unknown item");
    }
    composer_changed(hx, composer)
}

/// Change a composer line's quantity by `delta`; it never drops below one.
#[instrument(skip(session, _me, hx))]
pub async fn update_line(
    session: Session,
    hx: HxRequest,
    RequireRole(_me, _): RequireAdmin,
    Form(form): Form<LineForm>,
) -> Response {
    let mut composer = load_composer(&session).await;
    if composer
        .cart
        .update_quantity(&ItemId::new(form.item_id), form.delta)
        .is_some()
    {
        save_composer(&session, &composer).await;
    }
    composer_changed(hx, composer)
}

/// Take a line out of the composer.
#[instrument(skip(session, _me, hx))]
pub async fn remove_line(
    session: Session,
    hx: HxRequest,
    RequireRole(_me, _): RequireAdmin,
    Form(form): Form<LineForm>,
) -> Response {
    let mut composer = load_composer(&session).await;
    if composer.cart.remove_item(&ItemId::new(form.item_id)) {
        save_composer(&session, &composer).await;
    }
    composer_changed(hx, composer)
}

/// Discard the composer.
#[instrument(skip(session, _me))]
pub async fn reset(session: Session, RequireRole(_me, _): RequireAdmin) -> Response {
    clear_composer(&session).await;
    Redirect::to(PATH).into_response()
}

/// Post the composed order, as a new order or as an update of the one being
/// edited.
#[instrument(skip(state, session, me))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
) -> Response {
    let composer = load_composer(&session).await;
    let Some(order) = composer.staff_order() else {
        return redirect_with(
            &session,
            Notice::warning("Incomplete").with_text("Select a user and add items."),
            COMPOSER_PATH,
        )
        .await;
    };

    let (result, notice) = match &composer.editing {
        Some(id) => (
            state.api().update_order(&me.credentials, id, &order).await,
            Notice::success("Updated").with_text("Artisan order modified successfully."),
        ),
        None => (
            state.api().create_staff_order(&me.credentials, &order).await,
            Notice::success("Created").with_text("New artisan order placed."),
        ),
    };

    match result {
        Ok(()) => {
            tracing::info!(
                user_id = %order.user_id,
                lines = order.items.len(),
                editing = composer.editing.is_some(),
                "Staff order saved"
            );
            clear_composer(&session).await;
            redirect_with(&session, notice, PATH).await
        }
        Err(e) => api_failure(&session, &e, "Error", COMPOSER_PATH).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aromista_core::{Availability, Money};

    use super::*;
    use crate::api::{ItemRef, OrderItem};

    fn menu_item(id: &str, category: &str) -> MenuItem {
        MenuItem {
            id: ItemId::new(id),
            name: id.to_string(),
            description: String::new(),
            price: Money::from_rupees(400),
            category: category.to_string(),
            image_url: None,
            availability: Availability::Available,
        }
    }

    #[test]
    fn test_group_by_category_keeps_first_seen_order() {
        let groups = group_by_category(vec![
            menu_item("latte", "Coffee"),
            menu_item("scone", "Bakery"),
            menu_item("mocha", "Coffee"),
        ]);
        let summary: Vec<_> = groups
            .iter()
            .map(|g| (g.category.as_str(), g.items.len()))
            .collect();
        assert_eq!(summary, [("Coffee", 2), ("Bakery", 1)]);
    }

    #[test]
    fn test_staff_order_requires_user_and_lines() {
        let mut composer = Composer::default();
        assert!(composer.staff_order().is_none());

        composer.cart.add_item(&menu_item("latte", "Coffee").snapshot());
        assert!(composer.staff_order().is_none());

        composer.user = Some(UserRef {
            id: UserId::new("u1"),
            fullname: "Kasun".to_string(),
            email: "kasun@aromista.lk".to_string(),
        });
        composer.cart.add_item(&menu_item("latte", "Coffee").snapshot());
        let order = composer.staff_order().unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.total_amount, Money::from_rupees(800));
    }

    #[test]
    fn test_from_order_uses_recorded_unit_prices() {
        let order = Order {
            id: OrderId::new("o1"),
            user: None,
            items: vec![
                OrderItem {
                    item: Some(ItemRef {
                        id: ItemId::new("latte"),
                        name: "Latte".to_string(),
                        image_url: None,
                    }),
                    quantity: 3,
                    unit_price: Money::from_rupees(650),
                },
                OrderItem {
                    item: None,
                    quantity: 1,
                    unit_price: Money::from_rupees(100),
                },
            ],
            total_amount: Money::from_rupees(2_050),
            status: OrderStatus::Pending,
            created_at: None,
        };

        let composer = Composer::from_order(&order);
        assert_eq!(composer.editing, Some(OrderId::new("o1")));
        assert_eq!(composer.cart.lines().len(), 1);
        assert_eq!(composer.cart.total_amount(), Money::from_rupees(1_950));
    }
}
