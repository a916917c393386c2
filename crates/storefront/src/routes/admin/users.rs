//! Admin user management: paginated list with filters, create, edit,
//! delete and activate/deactivate.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::{AccountStatus, Role, UserId};

use crate::api::{ApiError, ManagedUser, Pagination, UserFilter, UserInput, UserStats};
use crate::filters;
use crate::middleware::{RequireAdmin, RequireRole};
use crate::models::Notice;
use crate::routes::{Layout, api_failure, redirect_with};
use crate::state::AppState;

const PATH: &str = "/admin/users";

static ASSIGNABLE_ROLES: [Role; 5] = Role::ASSIGNABLE;

// =============================================================================
// Listing
// =============================================================================

/// User list query parameters. `ALL` (or nothing) disables a filter.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub page: Option<u32>,
    pub role: Option<String>,
    pub status: Option<String>,
    /// Id of the user whose edit form is open.
    pub edit: Option<String>,
}

impl UsersQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            page: self.page.unwrap_or(1).max(1),
            limit: UserFilter::PAGE_SIZE,
            role: self
                .role
                .as_deref()
                .filter(|r| is_set(r))
                .map(Role::from),
            status: self
                .status
                .as_deref()
                .filter(|s| is_set(s))
                .and_then(|s| s.parse().ok()),
        }
    }
}

fn is_set(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case("ALL")
}

/// Users page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub layout: Layout,
    pub users: Vec<ManagedUser>,
    pub pagination: Pagination,
    pub stats: UserStats,
    pub filter: UserFilter,
    pub roles: &'static [Role],
    pub statuses: &'static [AccountStatus],
    /// The user being edited, when the edit form is open.
    pub editing: Option<ManagedUser>,
}

impl UsersTemplate {
    /// Query string for another page with the current filters.
    #[must_use]
    pub fn page_query(&self, page: &u32) -> String {
        format!(
            "page={}&role={}&status={}",
            *page,
            self.filter.role.as_ref().map_or("ALL", Role::as_str),
            self.filter.status.map_or("ALL", |s| s.as_str()),
        )
    }

    #[must_use]
    pub fn role_selected(&self, role: &Role) -> bool {
        self.filter.role.as_ref() == Some(role)
    }

    #[must_use]
    pub fn status_selected(&self, status: &AccountStatus) -> bool {
        self.filter.status.as_ref() == Some(status)
    }
}

/// Display one page of users.
#[instrument(skip(state, session, me))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Query(query): Query<UsersQuery>,
) -> Response {
    let filter = query.filter();
    let page = match state.api().list_users(&me.credentials, &filter).await {
        Ok(page) => page,
        Err(e) => return api_failure(&session, &e, "Could not load users", "/admin/dashboard").await,
    };

    let editing = query
        .edit
        .as_deref()
        .and_then(|id| page.data.iter().find(|u| u.id.as_str() == id))
        .cloned();

    UsersTemplate {
        layout: Layout::load(&session, Some(&me.user), PATH).await,
        users: page.data,
        pagination: page.pagination,
        stats: page.stats,
        filter,
        roles: &ASSIGNABLE_ROLES,
        statuses: AccountStatus::ALL,
        editing,
    }
    .into_response()
}

// =============================================================================
// Create / Update
// =============================================================================

/// Create/edit user form data.
#[derive(Debug, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: String,
}

impl UserForm {
    /// Build the API body. A password is required when creating and optional
    /// when editing (blank keeps the current one).
    fn into_input(self, creating: bool) -> Option<UserInput> {
        let fullname = self.fullname.trim().to_string();
        let email = self.email.trim().to_string();
        let password = Some(self.password).filter(|p| !p.is_empty());
        if fullname.is_empty() || email.is_empty() || (creating && password.is_none()) {
            return None;
        }

        let role = if self.role.trim().is_empty() {
            Role::Customer
        } else {
            Role::from(self.role.as_str())
        };
        let status = self.status.parse().unwrap_or_default();

        Some(UserInput::new(
            fullname,
            email,
            password,
            self.contact_number.trim().to_string(),
            role,
            status,
        ))
    }
}

/// What to show when the API refuses a create or update.
fn action_failed(error: &ApiError) -> Notice {
    match error {
        ApiError::Status { message, .. } if !message.is_empty() => Notice::error(message.clone()),
        _ => Notice::error("Action failed"),
    }
}

/// Create a user.
#[instrument(skip(state, session, me, form), fields(email = %form.email))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Form(form): Form<UserForm>,
) -> Response {
    let Some(input) = form.into_input(true) else {
        return redirect_with(&session, Notice::warning("Please fill required fields"), PATH).await;
    };

    match state.api().create_user(&me.credentials, &input).await {
        Ok(()) => {
            tracing::info!(role = %input.role, "User created");
            redirect_with(&session, Notice::success("User created successfully!"), PATH).await
        }
        Err(e @ ApiError::Unauthorized) => api_failure(&session, &e, "Action failed", PATH).await,
        Err(e) => {
            tracing::warn!(error = %e, "User create failed");
            redirect_with(&session, action_failed(&e), PATH).await
        }
    }
}

/// Update a user.
#[instrument(skip(state, session, me, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<UserForm>,
) -> Response {
    let edit_path = format!("{PATH}?edit={id}");
    let Some(input) = form.into_input(false) else {
        return redirect_with(&session, Notice::warning("Please fill required fields"), &edit_path)
            .await;
    };

    match state
        .api()
        .update_user(&me.credentials, &UserId::new(id), &input)
        .await
    {
        Ok(()) => redirect_with(&session, Notice::success("User updated successfully!"), PATH).await,
        Err(e @ ApiError::Unauthorized) => api_failure(&session, &e, "Action failed", PATH).await,
        Err(e) => {
            tracing::warn!(error = %e, "User update failed");
            redirect_with(&session, action_failed(&e), &edit_path).await
        }
    }
}

// =============================================================================
// Status / Delete
// =============================================================================

/// Flip a user between active and inactive.
#[instrument(skip(state, session, me))]
pub async fn toggle_status(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    match state
        .api()
        .toggle_user_status(&me.credentials, &UserId::new(id))
        .await
    {
        Ok(()) => Redirect::to(PATH).into_response(),
        Err(e) => api_failure(&session, &e, "Status toggle failed", PATH).await,
    }
}

/// Delete a user.
#[instrument(skip(state, session, me))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireRole(me, _): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    if id == me.user.id.as_str() {
        return redirect_with(
            &session,
            Notice::error("Delete failed").with_text("You cannot delete your own account."),
            PATH,
        )
        .await;
    }

    match state.api().delete_user(&me.credentials, &UserId::new(id)).await {
        Ok(()) => redirect_with(&session, Notice::success("User deleted!"), PATH).await,
        Err(e) => api_failure(&session, &e, "Delete failed", PATH).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str) -> UserForm {
        UserForm {
            fullname: "Nadeesha Perera".to_string(),
            email: "nadeesha@aromista.lk".to_string(),
            password: password.to_string(),
            contact_number: "0712345678".to_string(),
            role: "BARISTOR".to_string(),
            status: "INACTIVE".to_string(),
        }
    }

    #[test]
    fn test_password_required_only_when_creating() {
        assert!(form("").into_input(true).is_none());

        let input = form("").into_input(false).unwrap();
        assert!(input.password.is_none());
        assert_eq!(input.roles, vec![Role::Barista]);
        assert_eq!(input.approved, AccountStatus::Inactive);
    }

    #[test]
    fn test_name_and_email_required() {
        let mut missing = form("secret");
        missing.fullname = "  ".to_string();
        assert!(missing.into_input(true).is_none());
    }

    #[test]
    fn test_users_page_links_keep_filters() {
        let template = UsersTemplate {
            layout: Layout {
                user: None,
                notice: None,
                cart_count: 0,
                current_path: PATH,
            },
            users: vec![ManagedUser {
                id: UserId::new("u-7"),
                fullname: "Nadeesha Perera".to_string(),
                email: "nadeesha@aromista.lk".to_string(),
                contact_number: None,
                roles: vec![Role::Barista],
                approved: AccountStatus::Active,
                created_at: None,
            }],
            pagination: Pagination {
                page: 2,
                pages: 3,
                total: 45,
            },
            stats: UserStats::default(),
            filter: UserFilter {
                page: 2,
                limit: UserFilter::PAGE_SIZE,
                role: Some(Role::Barista),
                status: None,
            },
            roles: &ASSIGNABLE_ROLES,
            statuses: AccountStatus::ALL,
            editing: None,
        };

        assert_eq!(template.page_query(&3), "page=3&role=BARISTOR&status=ALL");

        let html = template.render().unwrap();
        assert!(html.contains("Nadeesha Perera"));
        assert!(html.contains("page=1"));
        assert!(html.contains("page=3"));
        assert!(html.contains("edit=u-7"));
        assert!(html.contains("Page 2 of 3"));
    }

    #[test]
    fn test_filter_query_treats_all_as_unset() {
        let query = UsersQuery {
            page: Some(0),
            role: Some("ALL".to_string()),
            status: Some("active".to_string()),
            edit: None,
        };
        let filter = query.filter();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, UserFilter::PAGE_SIZE);
        assert_eq!(filter.role, None);
        assert_eq!(filter.status, Some(AccountStatus::Active));
    }
}
