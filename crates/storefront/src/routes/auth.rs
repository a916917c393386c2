//! Authentication route handlers.
//!
//! Login exchanges the credentials for API tokens, loads the profile from
//! `/auth/me` and sends the user to the landing page of their highest role.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aromista_core::guard::LOGIN_PATH;
use aromista_core::{Email, landing_path};

use super::{Layout, redirect_with};
use crate::api::{ApiError, Credentials, Registration};
use crate::filters;
use crate::middleware::{OptionalUser, sign_in, sign_out};
use crate::models::Notice;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: SecretString,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: SecretString,
    #[serde(default)]
    pub password_confirm: SecretString,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub email: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub fullname: String,
    pub contact_number: String,
    pub email: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Signed-in visitors are sent straight to their landing page.
#[instrument(skip(session, user))]
pub async fn login_page(session: Session, OptionalUser(user): OptionalUser) -> Response {
    if let Some(user) = user {
        return Redirect::to(landing_path(&user.roles)).into_response();
    }

    LoginTemplate {
        layout: Layout::load(&session, None, LOGIN_PATH).await,
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let render_error = |message: &str, session: Session, email: String| {
        let message = message.to_string();
        async move {
            LoginTemplate {
                layout: Layout::load(&session, None, LOGIN_PATH).await,
                error: Some(message),
                email,
            }
            .into_response()
        }
    };

    let email = form.email.trim().to_string();
    if email.is_empty() || form.password.expose_secret().trim().is_empty() {
        return render_error("Please enter both email and password.", session, email).await;
    }

    let tokens = match state.api().login(&email, &form.password).await {
        Ok(tokens) => tokens,
        Err(e @ ApiError::Status { .. }) => {
            tracing::info!(error = %e, "Login rejected");
            return render_error(&e.user_message(), session, email).await;
        }
        Err(ApiError::Decode(e)) => {
            tracing::warn!(error = %e, "Login response without tokens");
            return render_error(
                "Login failed. Please check your credentials.",
                session,
                email,
            )
            .await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Login request failed");
            return render_error("An error occurred. Please try again.", session, email).await;
        }
    };

    let credentials = Credentials::detached(tokens);
    let user = match state.api().me(&credentials).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load profile after login");
            return render_error("An error occurred. Please try again.", session, email).await;
        }
    };

    if let Err(e) = sign_in(&session, &user, &credentials.tokens().await).await {
        tracing::error!("Failed to set session: {e}");
        return render_error("An error occurred. Please try again.", session, email).await;
    }

    tracing::info!(user_id = %user.id, "User signed in");
    Redirect::to(landing_path(&user.roles)).into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = sign_out(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    Redirect::to("/").into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(session))]
pub async fn register_page(session: Session) -> impl IntoResponse {
    RegisterTemplate {
        layout: Layout::load(&session, None, "/register").await,
        error: None,
        fullname: String::new(),
        contact_number: String::new(),
        email: String::new(),
    }
}

/// Handle registration form submission.
///
/// Passwords are compared before anything is sent to the API. On success
/// the visitor is sent to the login page.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = match validate_registration(&form) {
        Ok(registration) => registration,
        Err(message) => {
            return RegisterTemplate {
                layout: Layout::load(&session, None, "/register").await,
                error: Some(message.to_string()),
                fullname: form.fullname,
                contact_number: form.contact_number,
                email: form.email,
            }
            .into_response();
        }
    };

    match state.api().register(&registration).await {
        Ok(()) => {
            tracing::info!("Customer registered");
            redirect_with(
                &session,
                Notice::success("Registration successful!").with_text("Welcome to Aromista."),
                LOGIN_PATH,
            )
            .await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let message = match &e {
                ApiError::Status { message, .. } => {
                    format!("Registration failed. {message}")
                }
                _ => "Registration failed. Please try again.".to_string(),
            };
            RegisterTemplate {
                layout: Layout::load(&session, None, "/register").await,
                error: Some(message),
                fullname: form.fullname,
                contact_number: form.contact_number,
                email: form.email,
            }
            .into_response()
        }
    }
}

/// Check the registration form before calling the API.
fn validate_registration(form: &RegisterForm) -> Result<Registration, &'static str> {
    let fullname = form.fullname.trim();
    if fullname.is_empty() {
        return Err("Please enter your full name.");
    }

    let contact_number = form
        .contact_number
        .trim()
        .parse::<u64>()
        .map_err(|_| "Please enter a valid contact number.")?;

    let email = Email::parse(&form.email).map_err(|_| "Please enter a valid email address.")?;

    if form.password.expose_secret().is_empty() {
        return Err("Please choose a password.");
    }
    if form.password.expose_secret() != form.password_confirm.expose_secret() {
        return Err("Passwords do not match!");
    }

    Ok(Registration {
        fullname: fullname.to_string(),
        email,
        password: form.password.clone(),
        contact_number,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            fullname: " Tharindu Jayasekara ".to_string(),
            contact_number: "0771234567".to_string(),
            email: "Tharindu@Aromista.lk".to_string(),
            password: SecretString::from(password),
            password_confirm: SecretString::from(confirm),
        }
    }

    #[test]
    fn test_forms_deserialize_passwords_as_secrets() {
        let login: LoginForm = serde_json::from_value(serde_json::json!({
            "email": "nimali@aromista.lk",
            "password": "flat-white-42"
        }))
        .unwrap();
        assert_eq!(login.password.expose_secret(), "flat-white-42");
        assert!(!format!("{login:?}").contains("flat-white-42"));

        let empty: RegisterForm = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.password.expose_secret().is_empty());
        assert!(empty.password_confirm.expose_secret().is_empty());
    }

    #[test]
    fn test_password_mismatch_is_rejected_locally() {
        assert_eq!(
            validate_registration(&form("espresso1", "espresso2")).unwrap_err(),
            "Passwords do not match!"
        );
    }

    #[test]
    fn test_valid_registration() {
        let registration = validate_registration(&form("espresso1", "espresso1")).unwrap();
        assert_eq!(registration.fullname, "Tharindu Jayasekara");
        assert_eq!(registration.email.as_str(), "tharindu@aromista.lk");
        assert_eq!(registration.contact_number, 771_234_567);
    }

    #[test]
    fn test_contact_number_must_be_numeric() {
        let mut bad = form("a", "a");
        bad.contact_number = "077-123".to_string();
        assert_eq!(
            validate_registration(&bad).unwrap_err(),
            "Please enter a valid contact number."
        );
    }
}
