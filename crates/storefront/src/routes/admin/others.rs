//! Admin category management (the "Others" screen).

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

use aromista_core::CategoryId;

use crate::api::{ApiError, Category};
use crate::filters;
use crate::middleware::{RequireAdmin, RequireRole};
use crate::models::Notice;
use crate::routes::{Layout, api_failure, redirect_with};
use crate::state::AppState;

const PATH: &str = "/admin/others";

/// Categories list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OthersQuery {
    /// Id of the category being renamed.
    pub edit: Option<String>,
}

/// Category name form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub category_name: String,
}

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/others.html")]
pub struct OthersTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
    pub editing: Option<Category>,
}

/// Display every category.
#[instrument(skip(state, session, me))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Query(query): Query<OthersQuery>,
) -> Response {
    let categories = match state.api().categories(&me.credentials).await {
        Ok(categories) => categories.to_vec(),
        Err(e) => {
            return api_failure(&session, &e, "Failed to fetch categories", "/admin/dashboard")
                .await;
        }
    };

    let editing = query
        .edit
        .as_deref()
        .and_then(|id| categories.iter().find(|c| c.id.as_str() == id))
        .cloned();

    OthersTemplate {
        layout: Layout::load(&session, Some(&me.user), PATH).await,
        categories,
        editing,
    }
    .into_response()
}

/// The API's message, or the generic fallback.
fn failed(error: &ApiError, fallback: &str) -> Notice {
    match error {
        ApiError::Status { message, .. } if !message.is_empty() => Notice::error(message.clone()),
        _ => Notice::error(fallback),
    }
}

async fn report(session: &Session, error: &ApiError, fallback: &str, back: &str) -> Response {
    if matches!(error, ApiError::Unauthorized) {
        return api_failure(session, error, fallback, back).await;
    }
    tracing::warn!(error = %error, "{fallback}");
    redirect_with(session, failed(error, fallback), back).await
}

/// Create a category.
#[instrument(skip(state, session, me))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Form(form): Form<CategoryForm>,
) -> Response {
    let name = form.category_name.trim();
    if name.is_empty() {
        return redirect_with(&session, Notice::warning("Category name is required"), PATH).await;
    }

    match state.api().create_category(&me.credentials, name).await {
        Ok(()) => {
            redirect_with(&session, Notice::success("Category created successfully!"), PATH).await
        }
        Err(e) => report(&session, &e, "Action failed", PATH).await,
    }
}

/// Rename a category.
#[instrument(skip(state, session, me))]
pub async fn rename(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let back = format!("{PATH}?edit={id}");
    let name = form.category_name.trim();
    if name.is_empty() {
        return redirect_with(&session, Notice::warning("Category name is required"), &back).await;
    }

    match state
        .api()
        .update_category(&me.credentials, &CategoryId::new(id), name)
        .await
    {
        Ok(()) => {
            redirect_with(&session, Notice::success("Category updated successfully!"), PATH).await
        }
        Err(e) => report(&session, &e, "Action failed", &back).await,
    }
}

/// Flip a category between available and unavailable.
#[instrument(skip(state, session, me))]
pub async fn toggle_status(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .toggle_category_status(&me.credentials, &CategoryId::new(id))
        .await
    {
        Ok(()) => redirect_with(&session, Notice::success("Category status updated"), PATH).await,
        Err(e) => report(&session, &e, "Status toggle failed", PATH).await,
    }
}

/// Delete a category.
#[instrument(skip(state, session, me))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .delete_category(&me.credentials, &CategoryId::new(id))
        .await
    {
        Ok(()) => redirect_with(&session, Notice::success("Category deleted!"), PATH).await,
        Err(e) => report(&session, &e, "Delete failed", PATH).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_prefers_api_message() {
        let notice = failed(
            &ApiError::Status {
                status: 409,
                message: "Category already exists".to_string(),
            },
            "Action failed",
        );
        assert_eq!(notice.title, "Category already exists");

        let notice = failed(&ApiError::Unauthorized, "Delete failed");
        assert_eq!(notice.title, "Delete failed");
    }
}
