//! Customer screens: menu, order history, table booking and the static
//! about/service/contact pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::floor::{self, TableAvailability};
use aromista_core::{Availability, Email};

use super::{Layout, api_failure, redirect_with};
use crate::api::{Category, MenuItem, NewBooking, Order};
use crate::filters;
use crate::middleware::{RequireCustomer, RequireRole};
use crate::models::Notice;
use crate::state::AppState;

/// The "show everything" category filter.
pub const ALL_CATEGORIES: &str = "ALL";

const MENU_PATH: &str = "/customer/home";
const BOOKING_PATH: &str = "/customer/booking";
const CONTACT_PATH: &str = "/customer/contact";

// =============================================================================
// Menu
// =============================================================================

/// Menu query parameters.
#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

/// Customer menu template.
#[derive(Template, WebTemplate)]
#[template(path = "customer/menu.html")]
pub struct MenuTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
    pub items: Vec<MenuItem>,
    pub selected: String,
}

impl MenuTemplate {
    /// Heading above the item grid.
    #[must_use]
    pub fn heading(&self) -> &str {
        if self.selected == ALL_CATEGORIES {
            "The Collection"
        } else {
            self.selected.as_str()
        }
    }
}

/// Keep the items in `category`, or all of them for [`ALL_CATEGORIES`].
#[must_use]
pub fn filter_items(items: &[MenuItem], category: &str) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|item| category == ALL_CATEGORIES || item.category == category)
        .cloned()
        .collect()
}

/// Display the menu with the category filter.
///
/// Unavailable items are listed but cannot be added to the cart.
#[instrument(skip(state, session, me))]
pub async fn menu(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireCustomer,
    Query(query): Query<MenuQuery>,
) -> Response {
    let (items, categories) = tokio::join!(
        state.api().customer_items(&me.credentials),
        state.api().categories(&me.credentials),
    );

    let items = match items {
        Ok(items) => items,
        Err(e) => return api_failure(&session, &e, "Menu unavailable", "/").await,
    };
    // The menu still works without the filter bar.
    let categories = categories.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load categories");
            Vec::new()
        },
        |categories| {
            categories
                .iter()
                .filter(|c| c.status == Availability::Available)
                .cloned()
                .collect()
        },
    );

    let selected = query
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| ALL_CATEGORIES.to_string());

    MenuTemplate {
        layout: Layout::load(&session, Some(&me.user), MENU_PATH).await,
        items: filter_items(&items, &selected),
        categories,
        selected,
    }
    .into_response()
}

// =============================================================================
// Orders
// =============================================================================

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "customer/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<Order>,
}

/// Display the signed-in customer's orders, newest first.
#[instrument(skip(state, session, me))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireCustomer,
) -> Response {
    let mut orders = match state.api().my_orders(&me.credentials).await {
        Ok(orders) => orders,
        Err(e) => return api_failure(&session, &e, "Could not load orders", MENU_PATH).await,
    };
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    OrdersTemplate {
        layout: Layout::load(&session, Some(&me.user), "/customer/orders").await,
        orders,
    }
    .into_response()
}

// =============================================================================
// Table Booking
// =============================================================================

/// Booking page query: the slot being looked at and the table picked.
#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    pub date: Option<String>,
    pub time: Option<String>,
    pub table: Option<String>,
}

/// Table booking form data.
#[derive(Debug, Deserialize)]
pub struct BookingForm {
    pub table_number: String,
    pub booking_date: String,
    pub booking_time: String,
}

/// A validated date and time slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub date: String,
    pub time: String,
}

impl Slot {
    /// Parse `YYYY-MM-DD` and `HH:MM`, refusing dates before `today`.
    ///
    /// # Errors
    ///
    /// Returns the message to show when either part is invalid.
    pub fn parse(date: &str, time: &str, today: NaiveDate) -> Result<Self, &'static str> {
        let parsed_date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| "Please pick a valid date.")?;
        if parsed_date < today {
            return Err("Please pick a date from today onwards.");
        }
        let parsed_time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|_| "Please pick a valid time.")?;

        Ok(Self {
            date: parsed_date.format("%Y-%m-%d").to_string(),
            time: parsed_time.format("%H:%M").to_string(),
        })
    }
}

/// Table booking template.
#[derive(Template, WebTemplate)]
#[template(path = "customer/booking.html")]
pub struct BookingTemplate {
    pub layout: Layout,
    pub min_date: String,
    pub date: String,
    pub time: String,
    /// `None` until a valid slot is chosen; the floor plan is greyed out.
    pub tables: Option<Vec<TableAvailability>>,
    pub selected: Option<&'static floor::Table>,
    pub error: Option<String>,
}

/// Display the floor plan for the chosen date and time.
#[instrument(skip(state, session, me))]
pub async fn booking_page(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireCustomer,
    Query(query): Query<BookingQuery>,
) -> Response {
    let today = Utc::now().date_naive();
    let date = query.date.unwrap_or_default();
    let time = query.time.unwrap_or_default();

    let mut error = None;
    let mut tables = None;
    let mut selected = None;

    if !date.is_empty() && !time.is_empty() {
        match Slot::parse(&date, &time, today) {
            Ok(slot) => {
                let booked = match state
                    .api()
                    .booked_tables(&me.credentials, &slot.date, &slot.time)
                    .await
                {
                    Ok(booked) => booked,
                    Err(e) => {
                        return api_failure(&session, &e, "Could not load tables", BOOKING_PATH)
                            .await;
                    }
                };
                let plan = floor::availability(&booked, query.table.as_deref());
                selected = plan.iter().find(|t| t.selected).map(|t| t.table);
                tables = Some(plan);
            }
            Err(message) => error = Some(message.to_string()),
        }
    }

    BookingTemplate {
        layout: Layout::load(&session, Some(&me.user), BOOKING_PATH).await,
        min_date: today.format("%Y-%m-%d").to_string(),
        date,
        time,
        tables,
        selected,
        error,
    }
    .into_response()
}

/// Reserve the selected table.
#[instrument(skip(state, session, me))]
pub async fn book_table(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireCustomer,
    Form(form): Form<BookingForm>,
) -> Response {
    let slot = match Slot::parse(&form.booking_date, &form.booking_time, Utc::now().date_naive()) {
        Ok(slot) => slot,
        Err(message) => {
            return redirect_with(&session, Notice::error("Failed").with_text(message), BOOKING_PATH)
                .await;
        }
    };
    let back = format!("{BOOKING_PATH}?date={}&time={}", slot.date, slot.time);

    let Some(table) = floor::find_table(&form.table_number) else {
        return redirect_with(
            &session,
            Notice::error("Failed").with_text("Please choose a table on the floor plan."),
            &back,
        )
        .await;
    };

    let booking = NewBooking {
        table_number: table.id.to_string(),
        booking_date: slot.date,
        booking_time: slot.time,
    };

    match state.api().create_booking(&me.credentials, &booking).await {
        Ok(()) => {
            tracing::info!(table = table.id, "Table reserved");
            redirect_with(
                &session,
                Notice::success("Reserved!").with_text(format!("Table {} is confirmed.", table.id)),
                &back,
            )
            .await
        }
        Err(e) => api_failure(&session, &e, "Failed", &back).await,
    }
}

// =============================================================================
// Static Pages
// =============================================================================

/// One card on the service page.
#[derive(Debug, Clone, Copy)]
pub struct ServiceCard {
    pub title: &'static str,
    pub description: &'static str,
}

pub const SERVICES: [ServiceCard; 4] = [
    ServiceCard {
        title: "Artisan Brewing",
        description: "Expertly crafted specialty coffee beans roasted to perfection.",
    },
    ServiceCard {
        title: "Swift Delivery",
        description: "Freshly brewed coffee delivered to your doorstep in minutes.",
    },
    ServiceCard {
        title: "Organic Sourcing",
        description: "100% sustainably sourced beans from local mountain farmers.",
    },
    ServiceCard {
        title: "Customer Care",
        description: "Dedicated support team available 24/7 for your coffee needs.",
    },
];

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "customer/about.html")]
pub struct AboutTemplate {
    pub layout: Layout,
}

/// Service page template.
#[derive(Template, WebTemplate)]
#[template(path = "customer/service.html")]
pub struct ServiceTemplate {
    pub layout: Layout,
    pub services: &'static [ServiceCard],
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "customer/contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub topics: &'static [&'static str],
}

const CONTACT_TOPICS: [&str; 3] = ["General Inquiry", "Bulk Bean Orders", "Private Booking"];

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub message: String,
}

#[instrument(skip(session, me))]
pub async fn about(session: Session, RequireRole(me, _): RequireCustomer) -> impl IntoResponse {
    AboutTemplate {
        layout: Layout::load(&session, Some(&me.user), "/customer/about").await,
    }
}

#[instrument(skip(session, me))]
pub async fn service(session: Session, RequireRole(me, _): RequireCustomer) -> impl IntoResponse {
    ServiceTemplate {
        layout: Layout::load(&session, Some(&me.user), "/customer/service").await,
        services: &SERVICES,
    }
}

#[instrument(skip(session, me))]
pub async fn contact_page(
    session: Session,
    RequireRole(me, _): RequireCustomer,
) -> impl IntoResponse {
    ContactTemplate {
        layout: Layout::load(&session, Some(&me.user), CONTACT_PATH).await,
        topics: &CONTACT_TOPICS,
    }
}

/// Acknowledge a contact message.
///
/// Messages are not sent anywhere; the form only confirms receipt.
#[instrument(skip(session, _me, form), fields(topic = %form.topic))]
pub async fn contact(
    session: Session,
    RequireRole(_me, _): RequireCustomer,
    Form(form): Form<ContactForm>,
) -> Response {
    let name = form.name.trim();
    if name.is_empty() || form.message.trim().is_empty() || Email::parse(&form.email).is_err() {
        return redirect_with(
            &session,
            Notice::warning("Almost there").with_text("Please add your name, email and a message."),
            CONTACT_PATH,
        )
        .await;
    }

    tracing::info!("Contact message received");
    redirect_with(
        &session,
        Notice::success("Message sent").with_text(format!("Thank you, {name}. We'll be in touch soon.")),
        CONTACT_PATH,
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aromista_core::{ItemId, Money};

    use super::*;

    fn item(name: &str, category: &str) -> MenuItem {
        MenuItem {
            id: ItemId::new(name.to_lowercase()),
            name: name.to_string(),
            description: String::new(),
            price: Money::from_rupees(700),
            category: category.to_string(),
            image_url: None,
            availability: Availability::Available,
        }
    }

    #[test]
    fn test_filter_items_by_category() {
        let items = vec![
            item("Latte", "Coffee"),
            item("Croissant", "Bakery"),
            item("Mocha", "Coffee"),
        ];

        assert_eq!(filter_items(&items, ALL_CATEGORIES).len(), 3);
        let coffee: Vec<_> = filter_items(&items, "Coffee")
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(coffee, ["Latte", "Mocha"]);
        assert!(filter_items(&items, "Tea").is_empty());
    }

    #[test]
    fn test_slot_parse() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let slot = Slot::parse("2026-03-14", "18:30", today).unwrap();
        assert_eq!(slot.date, "2026-03-14");
        assert_eq!(slot.time, "18:30");

        assert_eq!(
            Slot::parse("2026-03-13", "18:30", today).unwrap_err(),
            "Please pick a date from today onwards."
        );
        assert_eq!(
            Slot::parse("14/03/2026", "18:30", today).unwrap_err(),
            "Please pick a valid date."
        );
        assert_eq!(
            Slot::parse("2026-03-14", "6pm", today).unwrap_err(),
            "Please pick a valid time."
        );
    }
}
