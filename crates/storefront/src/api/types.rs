//! Wire types exchanged with the Aromista REST API.
//!
//! Entities use Mongo-style `_id` strings and camelCase field names.
//! References to other documents (`userId`, `items[].item`) arrive either
//! populated or as a bare id; only populated documents are kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use aromista_core::cart::ItemSnapshot;
use aromista_core::{
    AccountStatus, AuthenticatedUser, Availability, BookingId, BookingStatus, CategoryId, Email,
    ItemId, Money, OrderId, OrderLine, OrderStatus, PricedOrderLine, Role, UserId,
};

// =============================================================================
// Deserialization Helpers
// =============================================================================

/// Keep a reference only when the API populated it.
fn populated<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reference<T> {
        Document(T),
        Id(#[allow(dead_code)] String),
    }

    Ok(match Option::<Reference<T>>::deserialize(deserializer)? {
        Some(Reference::Document(doc)) => Some(doc),
        Some(Reference::Id(_)) | None => None,
    })
}

/// Contact numbers are stored as numbers but sometimes sent as strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Contact {
        Number(u64),
        Text(String),
    }

    Ok(
        Option::<Contact>::deserialize(deserializer)?.map(|contact| match contact {
            Contact::Number(n) => n.to_string(),
            Contact::Text(s) => s,
        }),
    )
}

// =============================================================================
// Accounts
// =============================================================================

/// Access and refresh tokens issued by `/auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenData {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Generic `{ data: T }` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: Option<T>,
}

/// `/auth/refresh` answers either `{ accessToken }` or `{ data: { accessToken } }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshEnvelope {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub data: Option<TokenData>,
}

impl RefreshEnvelope {
    pub(crate) fn into_access_token(self) -> Option<String> {
        self.access_token
            .or_else(|| self.data.and_then(|d| d.access_token))
            .filter(|t| !t.is_empty())
    }
}

/// The signed-in account as returned by `/auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MeUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub fullname: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl TryFrom<MeUser> for AuthenticatedUser {
    type Error = aromista_core::EmailError;

    fn try_from(user: MeUser) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id,
            fullname: user.fullname,
            email: Email::parse(&user.email)?,
            roles: user.roles,
        })
    }
}

/// A user referenced from an order or booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
}

/// An account as listed on the admin users screen.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub fullname: String,
    pub email: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub approved: AccountStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ManagedUser {
    /// The role shown in the table and preselected in the edit form.
    #[must_use]
    pub fn primary_role(&self) -> Role {
        self.roles.first().cloned().unwrap_or(Role::Customer)
    }
}

/// Page position returned by `/auth/getall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
}

const fn first_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            pages: 1,
            total: 0,
        }
    }
}

impl Pagination {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// Account counters returned alongside the user list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub all: u64,
    pub customer_count: u64,
    pub staff_count: u64,
    pub active_count: u64,
    pub inactive_count: u64,
}

/// One page of `/auth/getall`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub data: Vec<ManagedUser>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub stats: UserStats,
}

/// Filters for `/auth/getall`. `None` means `ALL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub page: u32,
    pub limit: u32,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}

impl UserFilter {
    /// Users per page on the admin screen.
    pub const PAGE_SIZE: u32 = 20;

    pub(crate) fn query(&self) -> [(&'static str, String); 4] {
        [
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.max(1).to_string()),
            (
                "role",
                self.role
                    .as_ref()
                    .map_or_else(|| "ALL".to_string(), |r| r.as_str().to_string()),
            ),
            (
                "status",
                self.status
                    .map_or_else(|| "ALL".to_string(), |s| s.as_str().to_string()),
            ),
        ]
    }
}

/// Body of `/auth/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// A new customer account for `/auth/register`.
#[derive(Debug)]
pub struct Registration {
    pub fullname: String,
    pub email: Email,
    pub password: secrecy::SecretString,
    pub contact_number: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistrationBody<'a> {
    pub fullname: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub contact_number: u64,
}

/// Body of `/auth/create` and `/auth/update/{id}`.
///
/// `role`/`status` mirror `roles`/`approved` for API versions that read
/// either spelling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub contact_number: String,
    pub role: Role,
    pub status: AccountStatus,
    pub roles: Vec<Role>,
    pub approved: AccountStatus,
}

impl UserInput {
    #[must_use]
    pub fn new(
        fullname: String,
        email: String,
        password: Option<String>,
        contact_number: String,
        role: Role,
        status: AccountStatus,
    ) -> Self {
        Self {
            fullname,
            email,
            password,
            contact_number,
            roles: vec![role.clone()],
            role,
            status,
            approved: status,
        }
    }
}

// =============================================================================
// Menu
// =============================================================================

/// A menu item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub availability: Availability,
}

impl MenuItem {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    /// What the cart records when the item is added.
    #[must_use]
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            item_id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}

/// A menu category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub category_name: String,
    #[serde(default)]
    pub status: Availability,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemsEnvelope {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CategoriesEnvelope {
    Wrapped {
        #[serde(default)]
        categories: Vec<Category>,
    },
    Bare(Vec<Category>),
}

impl From<CategoriesEnvelope> for Vec<Category> {
    fn from(envelope: CategoriesEnvelope) -> Self {
        match envelope {
            CategoriesEnvelope::Wrapped { categories } | CategoriesEnvelope::Bare(categories) => {
                categories
            }
        }
    }
}

/// Body of `/categories/create` and `/categories/update/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryInput<'a> {
    pub category_name: &'a str,
}

/// An uploaded item picture.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Multipart fields of `/items/create` and `/items/update/{id}`.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub image: Option<ImageUpload>,
}

impl ItemInput {
    /// Build the multipart form. Called once per attempt since forms are
    /// consumed when sent.
    pub(crate) fn to_form(&self) -> reqwest::multipart::Form {
        let form = reqwest::multipart::Form::new()
            .text("name", self.name.clone())
            .text("description", self.description.clone())
            .text("price", self.price.amount().to_string())
            .text("category", self.category.clone());

        match &self.image {
            Some(image) => {
                let part = reqwest::multipart::Part::bytes(image.bytes.clone())
                    .file_name(image.file_name.clone());
                let part = match part.mime_str(&image.content_type) {
                    Ok(part) => part,
                    Err(_) => reqwest::multipart::Part::bytes(image.bytes.clone())
                        .file_name(image.file_name.clone()),
                };
                form.part("image", part)
            }
            None => form,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// The item referenced by an order line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    #[serde(rename = "_id")]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, deserialize_with = "populated")]
    pub item: Option<ItemRef>,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Money,
}

impl OrderItem {
    /// Display name, falling back for items deleted since the order.
    #[must_use]
    pub fn name(&self) -> &str {
        self.item.as_ref().map_or("Removed item", |item| item.name.as_str())
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(rename = "userId", default, deserialize_with = "populated")]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Customer name for staff screens.
    #[must_use]
    pub fn customer_name(&self) -> &str {
        self.user.as_ref().map_or("Walk-in guest", |u| u.fullname.as_str())
    }

    /// `dd Mon yyyy, HH:MM` or an empty string.
    #[must_use]
    pub fn placed_at(&self) -> String {
        self.created_at
            .map(|at| at.format("%d %b %Y, %H:%M").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<UserRef>,
}

/// Body of `/orders/create`.
#[derive(Debug, Serialize)]
pub(crate) struct NewOrder<'a> {
    pub items: &'a [OrderLine],
}

/// Body of `/orders/create-admin` and `/orders/update-order/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffOrder {
    pub user_id: UserId,
    pub items: Vec<PricedOrderLine>,
    pub total_amount: Money,
}

/// `{ status }` body of the status endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdate<S> {
    pub status: S,
}

// =============================================================================
// Bookings
// =============================================================================

/// A table booking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: BookingId,
    #[serde(rename = "userId", default, deserialize_with = "populated")]
    pub user: Option<UserRef>,
    pub table_number: String,
    #[serde(default)]
    pub booking_date: String,
    #[serde(default)]
    pub booking_time: String,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    /// `YYYY-MM-DD`, whether the API sent a date or a full timestamp.
    #[must_use]
    pub fn date(&self) -> &str {
        self.booking_date.get(..10).unwrap_or(&self.booking_date)
    }

    #[must_use]
    pub fn guest_name(&self) -> &str {
        self.user.as_ref().map_or("Guest", |u| u.fullname.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookingsEnvelope {
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookedTablesEnvelope {
    #[serde(default)]
    pub booked_table_ids: Vec<String>,
}

/// Body of `/bookings/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub table_number: String,
    pub booking_date: String,
    pub booking_time: String,
}

/// `{ message }` error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_with_populated_references() {
        let order: Order = serde_json::from_value(json!({
            "_id": "665f1c2e9a",
            "userId": { "_id": "u1", "fullname": "Kasun Silva", "email": "kasun@aromista.lk" },
            "items": [
                { "item": { "_id": "i1", "name": "Latte", "imageUrl": null }, "quantity": 2, "unitPrice": 850 },
                { "item": "i2", "quantity": 1, "unitPrice": 400.5 }
            ],
            "totalAmount": 2100.5,
            "status": "PROCESSING",
            "createdAt": "2025-03-01T09:30:00.000Z"
        }))
        .unwrap();

        assert_eq!(order.customer_name(), "Kasun Silva");
        assert_eq!(order.items[0].name(), "Latte");
        assert_eq!(order.items[1].name(), "Removed item");
        assert_eq!(order.total_amount, Money::parse("2100.50").unwrap());
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.placed_at(), "01 Mar 2025, 09:30");
    }

    #[test]
    fn test_order_with_bare_user_id() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o2",
            "userId": "u9",
            "items": [],
            "totalAmount": 0,
            "status": "PENDING"
        }))
        .unwrap();
        assert!(order.user.is_none());
        assert_eq!(order.customer_name(), "Walk-in guest");
    }

    #[test]
    fn test_categories_accept_both_shapes() {
        let wrapped: CategoriesEnvelope = serde_json::from_value(json!({
            "categories": [{ "_id": "c1", "categoryName": "Coffee", "status": "AVAILABLE" }]
        }))
        .unwrap();
        let bare: CategoriesEnvelope = serde_json::from_value(json!([
            { "_id": "c1", "categoryName": "Coffee", "status": "AVAILABLE" }
        ]))
        .unwrap();

        assert_eq!(Vec::<Category>::from(wrapped), Vec::<Category>::from(bare));
    }

    #[test]
    fn test_managed_user_contact_number() {
        let user: ManagedUser = serde_json::from_value(json!({
            "_id": "u1",
            "fullname": "Dilini",
            "email": "dilini@aromista.lk",
            "contactNumber": 771234567,
            "roles": ["BARISTOR"],
            "approved": "INACTIVE"
        }))
        .unwrap();

        assert_eq!(user.contact_number.as_deref(), Some("771234567"));
        assert_eq!(user.primary_role(), Role::Barista);
        assert_eq!(user.approved, AccountStatus::Inactive);
    }

    #[test]
    fn test_refresh_envelope_shapes() {
        let top: RefreshEnvelope = serde_json::from_value(json!({ "accessToken": "a1" })).unwrap();
        let nested: RefreshEnvelope =
            serde_json::from_value(json!({ "data": { "accessToken": "a2" } })).unwrap();
        let empty: RefreshEnvelope = serde_json::from_value(json!({ "message": "ok" })).unwrap();

        assert_eq!(top.into_access_token().as_deref(), Some("a1"));
        assert_eq!(nested.into_access_token().as_deref(), Some("a2"));
        assert_eq!(empty.into_access_token(), None);
    }

    #[test]
    fn test_user_input_mirrors_role_and_status() {
        let input = UserInput::new(
            "Ruwan".to_string(),
            "ruwan@aromista.lk".to_string(),
            None,
            "0771234567".to_string(),
            Role::Cashier,
            AccountStatus::Active,
        );

        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["roles"], json!(["CASHIER"]));
        assert_eq!(body["approved"], json!("ACTIVE"));
        assert!(body.get("password").is_none());
    }

    #[test]
    fn test_user_filter_query() {
        let filter = UserFilter {
            page: 2,
            limit: UserFilter::PAGE_SIZE,
            role: Some(Role::Barista),
            status: None,
        };
        let query = filter.query();
        assert_eq!(query[2], ("role", "BARISTOR".to_string()));
        assert_eq!(query[3], ("status", "ALL".to_string()));
    }

    #[test]
    fn test_booking_date_trims_timestamp() {
        let booking: Booking = serde_json::from_value(json!({
            "_id": "b1",
            "tableNumber": "I3",
            "bookingDate": "2025-04-12T00:00:00.000Z",
            "bookingTime": "18:30",
            "status": "CONFIRMED"
        }))
        .unwrap();
        assert_eq!(booking.date(), "2025-04-12");
        assert_eq!(booking.guest_name(), "Guest");
    }
}
