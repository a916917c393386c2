//! Landing page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::landing_path;

use super::Layout;
use crate::filters;
use crate::middleware::{OptionalUser, RequireUser};

/// Public landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct LandingTemplate {
    pub layout: Layout,
    /// Where the "Get started" button goes.
    pub start_path: &'static str,
}

/// Signed-in home page for users without a role-specific screen.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
}

/// Display the landing page.
#[instrument(skip(session, user))]
pub async fn landing(session: Session, OptionalUser(user): OptionalUser) -> impl IntoResponse {
    let start_path = user
        .as_ref()
        .map_or("/login", |user| landing_path(&user.roles));

    LandingTemplate {
        layout: Layout::load(&session, user.as_ref(), "/").await,
        start_path,
    }
}

/// Display the generic signed-in home page.
#[instrument(skip(session, me))]
pub async fn home(session: Session, RequireUser(me): RequireUser) -> impl IntoResponse {
    HomeTemplate {
        layout: Layout::load(&session, Some(&me.user), "/home").await,
    }
}
