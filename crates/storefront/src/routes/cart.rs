//! Cart route handlers.
//!
//! The cart lives in the customer's session. Cart operations use HTMX for
//! dynamic updates without full page reloads; every change answers with an
//! `HX-Trigger: cart-updated` header so the badge in the header refreshes.
//! Plain form posts get a redirect back to the cart page instead.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::{Cart, ItemId, Money};

use super::{HxRequest, Layout, api_failure, redirect_with};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireCustomer, RequireRole};
use crate::models::{Notice, session_keys};
use crate::state::AppState;

const CART_PATH: &str = "/cart";
const MENU_PATH: &str = "/customer/home";
const ORDERS_PATH: &str = "/customer/orders";

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session, or an empty one.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read cart from session: {e}");
            Cart::default()
        }
    }
}

/// Store the cart in the session.
async fn save_cart(session: &Session, cart: &Cart) {
    if let Err(e) = session.insert(session_keys::CART, cart).await {
        tracing::error!("Failed to save cart to session: {e}");
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub item_id: String,
}

/// Update cart form data. `delta` is `1` or `-1` from the +/- buttons.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub delta: i32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: Cart,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: Cart,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Answer a cart change: the items fragment for HTMX, a redirect otherwise.
fn cart_changed(hx: HxRequest, cart: Cart) -> Response {
    if hx.0 {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate { cart },
        )
            .into_response()
    } else {
        Redirect::to(CART_PATH).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(session, me))]
pub async fn show(session: Session, RequireRole(me, _): RequireCustomer) -> impl IntoResponse {
    CartShowTemplate {
        layout: Layout::load(&session, Some(&me.user), CART_PATH).await,
        cart: load_cart(&session).await,
    }
}

/// Add one unit of a menu item to the cart (HTMX).
///
/// The item is looked up in the customer menu so the price and name come from
/// the API rather than the form. Unavailable items are refused.
#[instrument(skip(state, session, me, hx), fields(item_id = %form.item_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    hx: HxRequest,
    RequireRole(me, _): RequireCustomer,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let items = match state.api().customer_items(&me.credentials).await {
        Ok(items) => items,
        Err(e) => {
            if hx.0 {
                return AppError::from(e).into_response();
            }
            return api_failure(&session, &e, "Could not add item", MENU_PATH).await;
        }
    };

    let item_id = ItemId::new(form.item_id);
    let Some(item) = items.iter().find(|item| item.id == item_id) else {
        tracing::warn!("Add to cart for unknown item");
        if hx.0 {
            return AppError::NotFound(format!("menu item {item_id}")).into_response();
        }
        return redirect_with(&session, Notice::error("Item not found"), MENU_PATH).await;
    };

    if !item.is_available() {
        if hx.0 {
            return (
                StatusCode::CONFLICT,
                Html("<span class=\"cart-error\">Unavailable</span>"),
            )
                .into_response();
        }
        return redirect_with(
            &session,
            Notice::warning("Unavailable").with_text(format!("{} is not available right now.", item.name)),
            MENU_PATH,
        )
        .await;
    }

    let mut cart = load_cart(&session).await;
    let quantity = cart.add_item(&item.snapshot());
    save_cart(&session, &cart).await;
    tracing::debug!(quantity, "Item added to cart");

    if hx.0 {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response()
    } else {
        redirect_with(
            &session,
            Notice::success("Added to cart").with_text(item.name.clone()),
            MENU_PATH,
        )
        .await
    }
}

/// Change a line's quantity by `delta` (HTMX).
///
/// A line never drops below one unit; the remove button takes it out.
#[instrument(skip(session, _me, hx))]
pub async fn update(
    session: Session,
    hx: HxRequest,
    RequireRole(_me, _): RequireCustomer,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let mut cart = load_cart(&session).await;
    if cart
        .update_quantity(&ItemId::new(form.item_id), form.delta)
        .is_some()
    {
        save_cart(&session, &cart).await;
    }
    cart_changed(hx, cart)
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(session, _me, hx))]
pub async fn remove(
    session: Session,
    hx: HxRequest,
    RequireRole(_me, _): RequireCustomer,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut cart = load_cart(&session).await;
    if cart.remove_item(&ItemId::new(form.item_id)) {
        save_cart(&session, &cart).await;
    }
    cart_changed(hx, cart)
}

/// Empty the cart (HTMX).
#[instrument(skip(session, _me, hx))]
pub async fn clear(
    session: Session,
    hx: HxRequest,
    RequireRole(_me, _): RequireCustomer,
) -> Response {
    let mut cart = load_cart(&session).await;
    cart.clear();
    save_cart(&session, &cart).await;
    cart_changed(hx, cart)
}

/// Get cart count badge (HTMX).
#[instrument(skip(session, _me))]
pub async fn count(session: Session, RequireRole(_me, _): RequireCustomer) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}

/// Cart badge data for scripts.
#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub count: u32,
    pub total: Money,
}

/// Get the cart summary as JSON.
#[instrument(skip(session, _me))]
pub async fn summary(
    session: Session,
    RequireRole(_me, _): RequireCustomer,
) -> Json<CartSummary> {
    let cart = load_cart(&session).await;
    Json(CartSummary {
        count: cart.item_count(),
        total: cart.total_amount(),
    })
}

/// Place the order for everything in the cart.
///
/// An empty cart does nothing. The cart is cleared only once the API has
/// accepted the order; on failure it is kept so the customer can retry.
#[instrument(skip(state, session, me))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireCustomer,
) -> Response {
    let mut cart = load_cart(&session).await;
    if cart.is_empty() {
        return Redirect::to(CART_PATH).into_response();
    }

    match state
        .api()
        .place_order(&me.credentials, &cart.order_lines())
        .await
    {
        Ok(()) => {
            tracing::info!(
                lines = cart.lines().len(),
                total = %cart.total_amount(),
                "Order placed"
            );
            cart.clear();
            save_cart(&session, &cart).await;
            redirect_with(
                &session,
                Notice::success("Order Placed!").with_text("Our baristas are crafting your brew."),
                ORDERS_PATH,
            )
            .await
        }
        Err(e) => api_failure(&session, &e, "Order Failed", CART_PATH).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use aromista_core::{Money, cart::ItemSnapshot};
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_cart_survives_session_round_trip() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert!(load_cart(&session).await.is_empty());

        let mut cart = Cart::default();
        let mocha = ItemSnapshot {
            item_id: ItemId::new("mocha"),
            name: "Mocha".to_string(),
            price: Money::from_rupees(950),
            image_url: None,
        };
        cart.add_item(&mocha);
        cart.add_item(&mocha);
        save_cart(&session, &cart).await;

        let loaded = load_cart(&session).await;
        assert_eq!(loaded, cart);
        assert_eq!(loaded.item_count(), 2);
    }

    #[test]
    fn test_plain_post_redirects_to_cart() {
        let response = cart_changed(HxRequest(false), Cart::default());
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), CART_PATH);
    }

    #[test]
    fn test_htmx_post_triggers_badge_refresh() {
        let response = cart_changed(HxRequest(true), Cart::default());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("HX-Trigger").unwrap(),
            "cart-updated"
        );
    }
}
