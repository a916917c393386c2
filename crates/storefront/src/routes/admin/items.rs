//! Admin menu item management.
//!
//! Create and edit are multipart forms so a picture can be uploaded with the
//! item. Editing without a new picture keeps the current one.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::{ItemId, Money};

use crate::api::{ApiError, Category, ImageUpload, ItemInput, MenuItem};
use crate::filters;
use crate::middleware::{RequireAdmin, RequireRole};
use crate::models::Notice;
use crate::routes::{Layout, api_failure, redirect_with};
use crate::state::AppState;

const PATH: &str = "/admin/items";

/// Largest picture accepted, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Body limit for the item form: the picture plus the text fields.
pub const MAX_UPLOAD_BYTES: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Items list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    /// Id of the item whose edit form is open.
    pub edit: Option<String>,
}

/// Items page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/items.html")]
pub struct ItemsTemplate {
    pub layout: Layout,
    pub items: Vec<MenuItem>,
    pub categories: Vec<Category>,
    pub editing: Option<MenuItem>,
}

/// Display every menu item with the create/edit form.
#[instrument(skip(state, session, me))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Query(query): Query<ItemsQuery>,
) -> Response {
    let (items, categories) = tokio::join!(
        state.api().admin_items(&me.credentials),
        state.api().categories(&me.credentials),
    );

    let items = match items {
        Ok(items) => items,
        Err(e) => {
            return api_failure(&session, &e, "Failed to fetch items", "/admin/dashboard").await;
        }
    };
    let categories = categories.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load categories for item form");
            Vec::new()
        },
        |categories| categories.to_vec(),
    );

    let editing = query
        .edit
        .as_deref()
        .and_then(|id| items.iter().find(|item| item.id.as_str() == id))
        .cloned();

    ItemsTemplate {
        layout: Layout::load(&session, Some(&me.user), PATH).await,
        items,
        categories,
        editing,
    }
    .into_response()
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Raw fields of the item form.
#[derive(Debug, Default)]
struct ItemForm {
    name: String,
    description: String,
    price: String,
    category: String,
    image: Option<ImageUpload>,
}

/// Why an item form was refused.
#[derive(Debug)]
enum FormProblem {
    Multipart(MultipartError),
    Invalid(&'static str),
}

impl From<MultipartError> for FormProblem {
    fn from(error: MultipartError) -> Self {
        Self::Multipart(error)
    }
}

/// Read the multipart body. An empty file input means "no new picture".
async fn read_form(mut multipart: Multipart) -> Result<ItemForm, FormProblem> {
    let mut form = ItemForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = field.text().await?,
            "description" => form.description = field.text().await?,
            "price" => form.price = field.text().await?,
            "category" => form.category = field.text().await?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                if file_name.is_empty() || bytes.is_empty() {
                    continue;
                }
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(FormProblem::Invalid("The picture must be 5 MB or smaller."));
                }
                if !content_type.starts_with("image/") {
                    return Err(FormProblem::Invalid("The picture must be an image file."));
                }
                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!(field = other, "Ignoring unknown item form field"),
        }
    }

    Ok(form)
}

impl ItemForm {
    fn into_input(self) -> Result<ItemInput, FormProblem> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FormProblem::Invalid("Item name is required."));
        }
        let price = Money::parse(&self.price)
            .map_err(|_| FormProblem::Invalid("Please enter a valid price."))?;
        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(FormProblem::Invalid("Please choose a category."));
        }

        Ok(ItemInput {
            name,
            description: self.description.trim().to_string(),
            price,
            category,
            image: self.image,
        })
    }
}

async fn parse(multipart: Multipart) -> Result<ItemInput, FormProblem> {
    read_form(multipart).await?.into_input()
}

fn problem_notice(problem: &FormProblem) -> Notice {
    match problem {
        FormProblem::Multipart(e) => {
            tracing::warn!(error = %e, "Unreadable item form");
            Notice::error("Failed to add or update item").with_text(e.body_text())
        }
        FormProblem::Invalid(message) => {
            Notice::warning("Failed to add or update item").with_text(*message)
        }
    }
}

async fn save_failed(session: &Session, error: &ApiError, back: &str) -> Response {
    if matches!(error, ApiError::Unauthorized) {
        return api_failure(session, error, "Failed to add or update item", back).await;
    }
    tracing::warn!(error = %error, "Item save failed");
    redirect_with(session, Notice::error("Failed to add or update item"), back).await
}

// =============================================================================
// Mutations
// =============================================================================

/// Create a menu item.
#[instrument(skip(state, session, me, multipart))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    multipart: Multipart,
) -> Response {
    let input = match parse(multipart).await {
        Ok(input) => input,
        Err(problem) => return redirect_with(&session, problem_notice(&problem), PATH).await,
    };

    match state.api().create_item(&me.credentials, &input).await {
        Ok(()) => {
            tracing::info!(name = %input.name, "Menu item created");
            redirect_with(&session, Notice::success("Item added successfully"), PATH).await
        }
        Err(e) => save_failed(&session, &e, PATH).await,
    }
}

/// Update a menu item.
#[instrument(skip(state, session, me, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let back = format!("{PATH}?edit={id}");
    let input = match parse(multipart).await {
        Ok(input) => input,
        Err(problem) => return redirect_with(&session, problem_notice(&problem), &back).await,
    };

    match state
        .api()
        .update_item(&me.credentials, &ItemId::new(id), &input)
        .await
    {
        Ok(()) => redirect_with(&session, Notice::success("Item updated successfully"), PATH).await,
        Err(e) => save_failed(&session, &e, &back).await,
    }
}

/// Flip an item between available and unavailable.
#[instrument(skip(state, session, me))]
pub async fn toggle_status(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .toggle_item_status(&me.credentials, &ItemId::new(id))
        .await
    {
        Ok(()) => {
            redirect_with(&session, Notice::success("Item status updated successfully"), PATH).await
        }
        Err(e) => api_failure(&session, &e, "Status toggle failed", PATH).await,
    }
}

/// Delete a menu item.
#[instrument(skip(state, session, me))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state.api().delete_item(&me.credentials, &ItemId::new(id)).await {
        Ok(()) => redirect_with(&session, Notice::success("Item deleted successfully"), PATH).await,
        Err(e) => api_failure(&session, &e, "Failed to delete item", PATH).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(price: &str) -> ItemForm {
        ItemForm {
            name: " Iced Latte ".to_string(),
            description: "Double shot over ice".to_string(),
            price: price.to_string(),
            category: "Coffee".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_valid_item_form() {
        let input = form("950").into_input().unwrap();
        assert_eq!(input.name, "Iced Latte");
        assert_eq!(input.price, Money::from_rupees(950));
        assert!(input.image.is_none());
    }

    #[test]
    fn test_invalid_price_is_refused() {
        assert!(matches!(
            form("nine hundred").into_input(),
            Err(FormProblem::Invalid("Please enter a valid price."))
        ));
    }

    #[test]
    fn test_category_required() {
        let mut blank = form("950");
        blank.category = String::new();
        assert!(matches!(
            blank.into_input(),
            Err(FormProblem::Invalid("Please choose a category."))
        ));
    }
}
