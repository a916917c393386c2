//! Authentication middleware and extractors.
//!
//! Every guarded handler takes one of these extractors. The extractor loads
//! the signed-in user from the session and asks
//! [`Access::decide`](aromista_core::Access::decide) whether the page may be
//! shown:
//!
//! - nobody signed in: redirect to `/login` (or `401` under `/api/`)
//! - signed in without a required role: redirect to `/` with an
//!   "Access Denied" notice

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use aromista_core::guard::LOGIN_PATH;
use aromista_core::{Access, AuthenticatedUser, GuardDecision, Role};

use crate::api::Credentials;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{Notice, SessionTokens, push_notice, session_keys};

/// The signed-in user together with the tokens to call the API as them.
#[derive(Debug)]
pub struct SignedIn {
    pub user: AuthenticatedUser,
    pub credentials: Credentials,
}

/// A set of roles a route accepts.
pub trait RoleSet: Send + Sync + 'static {
    /// The requirement checked for this set.
    const ACCESS: Access;
}

const ADMIN_ROLES: &[Role] = &[Role::Admin];
const CUSTOMER_ROLES: &[Role] = &[Role::Customer];
const BARISTA_ROLES: &[Role] = &[Role::Barista];

/// `ADMIN` only.
pub struct Admins;

/// `CUSTOMER` only.
pub struct Customers;

/// `BARISTOR` only.
pub struct Baristas;

impl RoleSet for Admins {
    const ACCESS: Access = Access::AnyRole(ADMIN_ROLES);
}

impl RoleSet for Customers {
    const ACCESS: Access = Access::AnyRole(CUSTOMER_ROLES);
}

impl RoleSet for Baristas {
    const ACCESS: Access = Access::AnyRole(BARISTA_ROLES);
}

/// Error returned when a guarded page is requested without the right to see it.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in but lacking a role (for API requests).
    Forbidden,
    /// Signed in but lacking a role; redirect to the fallback page.
    Denied { fallback: &'static str },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::Denied { fallback } => Redirect::to(fallback).into_response(),
        }
    }
}

/// Extractor that requires any signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn home(RequireUser(me): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", me.user.first_name())
/// }
/// ```
pub struct RequireUser(pub SignedIn);

/// Extractor that requires a user holding one of the roles in `R`.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireRole(me, _): RequireAdmin) -> impl IntoResponse {
///     format!("Welcome back, {}", me.user.fullname)
/// }
/// ```
pub struct RequireRole<R: RoleSet>(pub SignedIn, pub PhantomData<R>);

/// Admin pages.
pub type RequireAdmin = RequireRole<Admins>;

/// Customer pages and the cart.
pub type RequireCustomer = RequireRole<Customers>;

/// The barista board.
pub type RequireBarista = RequireRole<Baristas>;

/// Run the guard for `access` against the session in `parts`.
async fn guard(parts: &Parts, access: Access) -> Result<SignedIn, AuthRejection> {
    let is_api = parts.uri.path().starts_with("/api/");
    let unauthenticated = || {
        if is_api {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        }
    };

    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    let user = current_user(session).await;
    match access.decide(user.as_ref()) {
        GuardDecision::Allow => {}
        GuardDecision::RedirectToLogin => return Err(unauthenticated()),
        GuardDecision::Deny { fallback } => {
            if is_api {
                return Err(AuthRejection::Forbidden);
            }
            tracing::info!(path = %parts.uri.path(), "Access denied for signed-in user");
            push_notice(
                session,
                Notice::error("Access Denied")
                    .with_text("You do not have permission to view that page."),
            )
            .await;
            return Err(AuthRejection::Denied { fallback });
        }
    }

    let (Some(user), Some(credentials)) = (user, Credentials::from_session(session).await) else {
        // A user without tokens cannot call the API; treat as signed out.
        return Err(unauthenticated());
    };

    Ok(SignedIn { user, credentials })
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guard(parts, Access::Authenticated).await.map(Self)
    }
}

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleSet,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guard(parts, R::ACCESS)
            .await
            .map(|signed_in| Self(signed_in, PhantomData))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike the guards, this never rejects the request.
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

async fn current_user(session: &Session) -> Option<AuthenticatedUser> {
    session
        .get::<AuthenticatedUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in user and their tokens in the session.
///
/// The session id is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(
    session: &Session,
    user: &AuthenticatedUser,
    tokens: &SessionTokens,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    session.insert(session_keys::TOKENS, tokens).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Drop everything stored for the visitor (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    clear_sentry_user();
    session.flush().await
}
