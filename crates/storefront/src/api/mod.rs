//! Aromista REST API client.
//!
//! # Architecture
//!
//! - The REST API is the source of truth; this client holds no state of its
//!   own apart from a short-lived menu cache (`moka`)
//! - JSON bodies, bearer token in `Authorization`
//! - A `401` on an authenticated call triggers one `/auth/refresh` and a
//!   single retry; the new access token is written back to the session
//!
//! # Example
//!
//! ```rust,ignore
//! use aromista_storefront::api::{ApiClient, Credentials};
//!
//! let client = ApiClient::new(&config.api)?;
//! let tokens = client.login("nimali@aromista.lk", &password).await?;
//! let credentials = Credentials::new(session, tokens);
//! let me = client.me(&credentials).await?;
//! let orders = client.my_orders(&credentials).await?;
//! ```

mod auth;
mod bookings;
mod cache;
mod catalog;
mod orders;
pub mod types;

pub use types::*;

use std::fmt;
use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;
use url::Url;

use crate::config::ApiConfig;
use crate::models::{SessionTokens, session_keys};

use cache::{CacheKey, CacheValue};

/// Errors that can occur when calling the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The session's tokens were rejected and could not be refreshed.
    #[error("API session is not authorized")]
    Unauthorized,

    /// Response body did not have the expected shape.
    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Text suitable for a notice shown to the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::Http(_) => "Could not reach Aromista. Please try again.".to_string(),
            Self::Decode(_) => "Aromista sent an unexpected response.".to_string(),
        }
    }

    /// HTTP status of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Http(_) | Self::Decode(_) => None,
        }
    }

    fn invalid(message: impl fmt::Display) -> Self {
        Self::Decode(<serde_json::Error as serde::de::Error>::custom(message))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

// =============================================================================
// Credentials
// =============================================================================

/// The tokens a request acts with.
///
/// Bound to the visitor's session so that a refreshed access token is kept
/// for the following requests.
pub struct Credentials {
    session: Option<Session>,
    tokens: Mutex<SessionTokens>,
}

impl Credentials {
    /// Credentials whose refreshed tokens are written back to `session`.
    #[must_use]
    pub fn new(session: Session, tokens: SessionTokens) -> Self {
        Self {
            session: Some(session),
            tokens: Mutex::new(tokens),
        }
    }

    /// Credentials that are not tied to a session.
    #[must_use]
    pub fn detached(tokens: SessionTokens) -> Self {
        Self {
            session: None,
            tokens: Mutex::new(tokens),
        }
    }

    /// Load the credentials stored in `session`, if the visitor is signed in.
    pub async fn from_session(session: &Session) -> Option<Self> {
        let tokens = session
            .get::<SessionTokens>(session_keys::TOKENS)
            .await
            .ok()
            .flatten()?;
        Some(Self::new(session.clone(), tokens))
    }

    /// The current token pair.
    pub async fn tokens(&self) -> SessionTokens {
        self.tokens.lock().await.clone()
    }

    async fn bearer(&self) -> SecretString {
        SecretString::from(self.tokens.lock().await.access_token.clone())
    }

    async fn refresh_token(&self) -> Option<SecretString> {
        self.tokens
            .lock()
            .await
            .refresh_token
            .clone()
            .map(SecretString::from)
    }

    async fn replace_access_token(&self, access: &SecretString) {
        let tokens = {
            let mut tokens = self.tokens.lock().await;
            tokens.access_token = access.expose_secret().to_string();
            tokens.clone()
        };

        if let Some(session) = &self.session
            && let Err(e) = session.insert(session_keys::TOKENS, tokens).await
        {
            tracing::warn!("Failed to store refreshed token in session: {e}");
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("session", &self.session.as_ref().and_then(Session::id))
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Aromista REST API.
///
/// Cheap to clone. The customer menu (items and categories) is cached for the
/// configured TTL; item and category mutations invalidate it.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new REST API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("aromista-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.menu_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Absolute URL of an API path such as `/orders/getall`.
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.inner.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    /// Absolute URL of a single resource, e.g. `/orders/update-status` + id.
    ///
    /// The id is percent-encoded as one path segment, so `/`, `?` or `#`
    /// inside it cannot reach another endpoint.
    fn resource_endpoint(&self, path: &str, id: &impl fmt::Display) -> Result<String> {
        let id = id.to_string();
        if matches!(id.as_str(), "" | "." | "..") {
            return Err(ApiError::invalid(format!("invalid resource id {id:?}")));
        }

        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::invalid("API base URL cannot take a path"))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()))
            .push(&id);
        Ok(url.into())
    }

    /// Send an unauthenticated request.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        check_status(response).await
    }

    /// Send a request with the bearer token from `credentials`.
    ///
    /// `build` is called once per attempt, so bodies that are consumed when
    /// sent (multipart forms) are rebuilt for the retry.
    async fn send_authed<F>(&self, credentials: &Credentials, build: F) -> Result<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = credentials.bearer().await;
        let response = build(&self.inner.client)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        let Some(refresh_token) = credentials.refresh_token().await else {
            return Err(ApiError::Unauthorized);
        };

        tracing::debug!("Access token rejected, refreshing");
        let access = match self.refresh(&refresh_token).await {
            Ok(access) => access,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                return Err(ApiError::Unauthorized);
            }
        };
        credentials.replace_access_token(&access).await;

        let response = build(&self.inner.client)
            .bearer_auth(access.expose_secret())
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        check_status(response).await
    }

    /// `GET` an authenticated JSON resource.
    async fn get_json<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .send_authed(credentials, |client| client.get(&url))
            .await?;
        decode(response).await
    }

    /// Drop the cached customer menu.
    pub async fn invalidate_menu(&self) {
        self.inner.cache.invalidate(&CacheKey::CustomerItems).await;
        self.inner.cache.invalidate(&CacheKey::Categories).await;
    }
}

/// Turn a non-success response into [`ApiError::Status`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    tracing::debug!(status = %status, message = %message, "API returned non-success status");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Read a JSON body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %String::from_utf8_lossy(&bytes).chars().take(500).collect::<String>(),
            "Failed to parse API response"
        );
        ApiError::Decode(e)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aromista_core::{OrderId, UserId};

    use super::*;

    #[test]
    fn test_user_messages() {
        let err = ApiError::Status {
            status: 409,
            message: "Table already booked".to_string(),
        };
        assert_eq!(err.user_message(), "Table already booked");
        assert_eq!(err.status(), Some(409));
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert!(ApiError::invalid("missing data").to_string().contains("missing data"));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ApiConfig::new(Url::parse("http://localhost:5000/api/v1/").unwrap());
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/orders/getall"),
            "http://localhost:5000/api/v1/orders/getall"
        );
    }

    #[test]
    fn test_resource_ids_stay_in_their_segment() {
        let config = ApiConfig::new(Url::parse("http://localhost:5000/api/v1/").unwrap());
        let client = ApiClient::new(&config).unwrap();

        let url = client
            .resource_endpoint("/orders/update-status", &OrderId::new("665f1c2e9b1d"))
            .unwrap();
        assert_eq!(url, "http://localhost:5000/api/v1/orders/update-status/665f1c2e9b1d");

        let url = client
            .resource_endpoint(
                "/orders/update-status",
                &OrderId::new("x/../../auth/status/u1?a=1#f"),
            )
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:5000/api/v1/orders/update-status/x%2F..%2F..%2Fauth%2Fstatus%2Fu1%3Fa=1%23f"
        );
        let parsed = reqwest::Url::parse(&url).unwrap();
        assert_eq!(parsed.path_segments().unwrap().count(), 5);

        for id in ["", ".", ".."] {
            assert!(
                client
                    .resource_endpoint("/auth/delete", &UserId::new(id))
                    .is_err(),
                "{id:?}"
            );
        }
    }
}
