//! End-to-end storefront flows against the fake REST API.

#![allow(clippy::unwrap_used)]

use aromista_integration_tests::{
    ADMIN, BARISTA, CUSTOMER, FLAT_WHITE, FakeApi, LATTE, SEEDED_ORDER, StaffOrderCall,
    Storefront, location,
};
use reqwest::StatusCode;
use serde_json::json;

async fn setup() -> (FakeApi, Storefront) {
    let api = FakeApi::spawn().await;
    let storefront = Storefront::spawn(&api).await;
    (api, storefront)
}

// ============================================================================
// Sign-in and Guards
// ============================================================================

#[tokio::test]
async fn test_login_lands_each_role_on_its_screen() {
    let (_api, storefront) = setup().await;

    for (account, landing) in [
        (CUSTOMER, "/customer/home"),
        (ADMIN, "/admin/dashboard"),
        (BARISTA, "/baristor/dashboard"),
    ] {
        let visitor = storefront.new_visitor();
        let response = visitor.sign_in(account).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", account.email);
        assert_eq!(location(&response), Some(landing), "{}", account.email);

        let page = visitor.get(landing).await;
        assert_eq!(page.status(), StatusCode::OK, "{}", account.email);
    }
}

#[tokio::test]
async fn test_login_with_wrong_password_shows_api_message() {
    let (_api, storefront) = setup().await;

    let response = storefront
        .post(
            "/login",
            &[("email", CUSTOMER.email), ("password", "not-my-password")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid email or password"));
    assert!(body.contains(CUSTOMER.email));
}

#[tokio::test]
async fn test_signed_in_visitor_is_sent_away_from_login() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    let response = storefront.get("/login").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/customer/home"));
}

#[tokio::test]
async fn test_customer_is_denied_staff_screens() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    for path in ["/admin/dashboard", "/admin/users", "/baristor/dashboard"] {
        let response = storefront.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/"), "{path}");

        let landing = storefront.get("/").await.text().await.unwrap();
        assert!(landing.contains("Access Denied"), "{path}");
    }

    // The notice is shown once.
    let landing = storefront.get("/").await.text().await.unwrap();
    assert!(!landing.contains("Access Denied"));
}

#[tokio::test]
async fn test_json_routes_refuse_with_status_codes() {
    let (_api, storefront) = setup().await;

    let response = storefront.get("/api/cart").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    storefront.sign_in(BARISTA).await;
    let response = storefront.get("/api/cart").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_barista_cannot_use_the_cart() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(BARISTA).await;

    let response = storefront.post("/cart/add", &[("item_id", LATTE)]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    let response = storefront.post("/logout", &[]).await;
    assert_eq!(location(&response), Some("/"));

    let response = storefront.get("/customer/home").await;
    assert_eq!(location(&response), Some("/login"));
}

// ============================================================================
// Cart and Checkout
// ============================================================================

#[tokio::test]
async fn test_adding_the_same_item_twice_merges_the_line() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    let first = storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("hx-trigger").unwrap(), "cart-updated");

    let second = storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;
    let badge = second.text().await.unwrap();
    assert!(badge.contains(">2<"), "{badge}");

    let cart = storefront.get("/cart").await.text().await.unwrap();
    assert_eq!(cart.matches("class=\"cart-line\"").count(), 1);
    assert!(cart.contains("LKR 1,700.00"));
}

#[tokio::test]
async fn test_quantity_controls_never_go_below_one() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;
    storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;

    for (delta, expected) in [("-1", 1), ("-1", 1), ("1", 2), ("1", 3)] {
        let response = storefront
            .hx_post("/cart/update", &[("item_id", LATTE), ("delta", delta)])
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");
        assert_eq!(storefront.cart_summary().await["count"], expected, "delta {delta}");
    }
    assert_eq!(storefront.cart_summary().await["total"].as_f64(), Some(2550.0));

    // Without HTMX the customer is sent back to the cart page.
    let response = storefront
        .post("/cart/update", &[("item_id", LATTE), ("delta", "-1")])
        .await;
    assert_eq!(location(&response), Some("/cart"));
    assert_eq!(storefront.cart_summary().await["count"], 2);
}

#[tokio::test]
async fn test_remove_and_clear_empty_the_cart() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;
    let response = storefront.hx_post("/cart/remove", &[("item_id", LATTE)]).await;
    let fragment = response.text().await.unwrap();
    assert!(!fragment.contains("class=\"cart-line\""), "{fragment}");
    assert_eq!(storefront.cart_summary().await["count"], 0);

    storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;
    storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;
    let response = storefront.post("/cart/clear", &[]).await;
    assert_eq!(location(&response), Some("/cart"));
    assert_eq!(storefront.cart_summary().await["count"], 0);
}

#[tokio::test]
async fn test_unavailable_and_unknown_items_are_refused() {
    let (_api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    let unavailable = storefront
        .hx_post("/cart/add", &[("item_id", FLAT_WHITE)])
        .await;
    assert_eq!(unavailable.status(), StatusCode::CONFLICT);

    let unknown = storefront
        .hx_post("/cart/add", &[("item_id", "item-cold-brew")])
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let badge = storefront.get("/cart/count").await.text().await.unwrap();
    assert!(!badge.contains("badge"), "{badge}");
}

#[tokio::test]
async fn test_checkout_posts_lines_and_clears_the_cart() {
    let (api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;
    storefront.hx_post("/cart/add", &[("item_id", LATTE)]).await;

    let response = storefront.post("/cart/checkout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/customer/orders"));

    assert_eq!(
        api.placed_orders(),
        vec![json!({ "items": [{ "item": LATTE, "quantity": 2 }] })]
    );

    let orders = storefront.get("/customer/orders").await.text().await.unwrap();
    assert!(orders.contains("Order Placed!"));
    assert!(orders.contains("Caramel Latte"));

    let badge = storefront.get("/cart/count").await.text().await.unwrap();
    assert!(!badge.contains("badge"), "{badge}");
}

#[tokio::test]
async fn test_checkout_with_empty_cart_posts_nothing() {
    let (api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    let response = storefront.post("/cart/checkout", &[]).await;
    assert_eq!(location(&response), Some("/cart"));
    assert!(api.placed_orders().is_empty());
}

// ============================================================================
// Table Booking
// ============================================================================

#[tokio::test]
async fn test_booking_posts_the_chosen_table() {
    let (api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    let response = storefront
        .post(
            "/customer/booking",
            &[
                ("table_number", "i3"),
                ("booking_date", "2099-12-31"),
                ("booking_time", "18:30"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some("/customer/booking?date=2099-12-31&time=18:30")
    );

    assert_eq!(
        api.bookings(),
        vec![json!({ "tableNumber": "I3", "bookingDate": "2099-12-31", "bookingTime": "18:30" })]
    );

    let page = storefront
        .get("/customer/booking?date=2099-12-31&time=18:30")
        .await
        .text()
        .await
        .unwrap();
    assert!(page.contains("Reserved!"));
    assert!(page.contains("Table I3 is confirmed."));
}

#[tokio::test]
async fn test_booking_in_the_past_is_refused() {
    let (api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    let response = storefront
        .post(
            "/customer/booking",
            &[
                ("table_number", "I3"),
                ("booking_date", "2001-01-01"),
                ("booking_time", "18:30"),
            ],
        )
        .await;
    assert_eq!(location(&response), Some("/customer/booking"));
    assert!(api.bookings().is_empty());
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_composer_posts_priced_lines_for_a_customer() {
    let (api, storefront) = setup().await;
    storefront.sign_in(ADMIN).await;

    let results = storefront
        .hx_get("/admin/orders/compose/users?q=nimali")
        .await
        .text()
        .await
        .unwrap();
    assert!(results.contains(CUSTOMER.fullname), "{results}");

    storefront
        .hx_post(
            "/admin/orders/compose/user",
            &[
                ("id", CUSTOMER.id),
                ("fullname", CUSTOMER.fullname),
                ("email", CUSTOMER.email),
            ],
        )
        .await;
    storefront
        .hx_post("/admin/orders/compose/add", &[("item_id", LATTE)])
        .await;
    let composer = storefront
        .hx_post("/admin/orders/compose/add", &[("item_id", LATTE)])
        .await
        .text()
        .await
        .unwrap();
    assert!(composer.contains("Caramel Latte"), "{composer}");

    let response = storefront.post("/admin/orders/compose/submit", &[]).await;
    assert_eq!(location(&response), Some("/admin/orders"));

    let calls = api.staff_orders();
    assert_eq!(calls.len(), 1);
    let StaffOrderCall { updated, body } = &calls[0];
    assert_eq!(updated, &None);
    assert_eq!(body["userId"], CUSTOMER.id);
    assert_eq!(body["items"][0]["item"], LATTE);
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["items"][0]["unitPrice"].as_f64(), Some(850.0));
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalAmount"].as_f64(), Some(1700.0));
}

#[tokio::test]
async fn test_composer_edits_an_existing_order() {
    let (api, storefront) = setup().await;
    storefront.sign_in(ADMIN).await;

    let response = storefront
        .post(&format!("/admin/orders/{SEEDED_ORDER}/edit"), &[])
        .await;
    assert_eq!(location(&response), Some("/admin/orders?compose=1"));

    storefront
        .hx_post(
            "/admin/orders/compose/update",
            &[("item_id", LATTE), ("delta", "1")],
        )
        .await;
    storefront.post("/admin/orders/compose/submit", &[]).await;

    let calls = api.staff_orders();
    assert_eq!(calls.len(), 1);
    let StaffOrderCall { updated, body } = &calls[0];
    assert_eq!(updated.as_deref(), Some(SEEDED_ORDER));
    assert_eq!(body["userId"], CUSTOMER.id);
    assert_eq!(body["items"][0]["quantity"], 2);
    // Lines keep the price recorded on the order.
    assert_eq!(body["items"][0]["unitPrice"].as_f64(), Some(800.0));
    assert_eq!(body["totalAmount"].as_f64(), Some(1600.0));
}

#[tokio::test]
async fn test_composer_refuses_an_incomplete_order() {
    let (api, storefront) = setup().await;
    storefront.sign_in(ADMIN).await;

    storefront
        .hx_post("/admin/orders/compose/add", &[("item_id", LATTE)])
        .await;
    let response = storefront.post("/admin/orders/compose/submit", &[]).await;
    assert_eq!(location(&response), Some("/admin/orders?compose=1"));
    assert!(api.staff_orders().is_empty());

    let page = storefront
        .get("/admin/orders?compose=1")
        .await
        .text()
        .await
        .unwrap();
    assert!(page.contains("Select a user and add items."));
}

#[tokio::test]
async fn test_admin_cannot_delete_their_own_account() {
    let (api, storefront) = setup().await;
    storefront.sign_in(ADMIN).await;

    let response = storefront
        .post(&format!("/admin/users/{}/delete", ADMIN.id), &[])
        .await;
    assert_eq!(location(&response), Some("/admin/users"));
    assert!(api.deleted_users().is_empty());

    let page = storefront.get("/admin/users").await.text().await.unwrap();
    assert!(page.contains("You cannot delete your own account."));

    storefront
        .post(&format!("/admin/users/{}/delete", CUSTOMER.id), &[])
        .await;
    assert_eq!(api.deleted_users(), vec![CUSTOMER.id.to_string()]);
}

// ============================================================================
// Token Refresh
// ============================================================================

#[tokio::test]
async fn test_expired_access_token_is_refreshed_once() {
    let (api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    api.expire_access_tokens();

    let response = storefront.get("/customer/orders").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(api.refresh_calls(), 1);

    // The refreshed token was kept in the session.
    let response = storefront.get("/customer/orders").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(api.refresh_calls(), 1);
}

#[tokio::test]
async fn test_rejected_refresh_signs_the_visitor_out() {
    let (api, storefront) = setup().await;
    storefront.sign_in(CUSTOMER).await;

    api.revoke_all_tokens();

    let response = storefront.get("/customer/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert_eq!(api.refresh_calls(), 1);

    let login = storefront.get("/login").await.text().await.unwrap();
    assert!(login.contains("Session expired"));

    let response = storefront.get("/customer/home").await;
    assert_eq!(location(&response), Some("/login"));
}
