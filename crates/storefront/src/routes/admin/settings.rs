//! Admin settings: the profile form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, response::{IntoResponse, Response}};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{RequireAdmin, RequireRole};
use crate::models::Notice;
use crate::routes::{Layout, redirect_with};

const PATH: &str = "/admin/settings";

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/settings.html")]
pub struct SettingsTemplate {
    pub layout: Layout,
    pub fullname: String,
    pub email: String,
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact_number: String,
}

/// Display the profile form, filled from the signed-in admin.
#[instrument(skip(session, me))]
pub async fn show(session: Session, RequireRole(me, _): RequireAdmin) -> impl IntoResponse {
    SettingsTemplate {
        layout: Layout::load(&session, Some(&me.user), PATH).await,
        fullname: me.user.fullname.clone(),
        email: me.user.email.to_string(),
    }
}

/// Acknowledge the profile form.
///
/// The API has no profile endpoint, so nothing is stored.
#[instrument(skip(session, _me, form))]
pub async fn save(
    session: Session,
    RequireRole(_me, _): RequireAdmin,
    Form(form): Form<ProfileForm>,
) -> Response {
    if form.fullname.trim().is_empty() || form.email.trim().is_empty() {
        return redirect_with(&session, Notice::warning("Please fill required fields"), PATH).await;
    }
    redirect_with(
        &session,
        Notice::success("Saved!").with_text("Profile details updated."),
        PATH,
    )
    .await
}
