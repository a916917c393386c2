//! Account endpoints (`/auth/*`).

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use aromista_core::{AuthenticatedUser, UserId};

use super::types::{
    DataEnvelope, LoginRequest, MeUser, RefreshEnvelope, Registration, RegistrationBody, TokenData,
    UserFilter, UserInput, UserPage,
};
use super::{ApiClient, ApiError, Credentials, Result, decode};
use crate::models::SessionTokens;

impl ApiClient {
    /// Exchange email and password for a token pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with the API's message when the
    /// credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SessionTokens> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let request = self.inner.client.post(self.endpoint("/auth/login")).json(&body);
        let envelope: DataEnvelope<TokenData> = decode(self.send(request).await?).await?;

        let data = envelope
            .data
            .ok_or_else(|| ApiError::invalid("login response has no data"))?;
        let access_token = data
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::invalid("login response has no access token"))?;

        Ok(SessionTokens {
            access_token,
            refresh_token: data.refresh_token.filter(|t| !t.is_empty()),
        })
    }

    /// Create a customer account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] when the API rejects the registration
    /// (e.g. the email is taken).
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let body = RegistrationBody {
            fullname: &registration.fullname,
            email: registration.email.as_str(),
            password: registration.password.expose_secret(),
            contact_number: registration.contact_number,
        };
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/register"))
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    /// The account the credentials belong to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the profile is malformed.
    #[instrument(skip(self, credentials))]
    pub async fn me(&self, credentials: &Credentials) -> Result<AuthenticatedUser> {
        let envelope: DataEnvelope<MeUser> = self.get_json(credentials, "/auth/me").await?;
        let user = envelope
            .data
            .ok_or_else(|| ApiError::invalid("profile response has no data"))?;
        AuthenticatedUser::try_from(user).map_err(ApiError::invalid)
    }

    /// Trade a refresh token for a new access token.
    pub(super) async fn refresh(&self, refresh_token: &SecretString) -> Result<SecretString> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/refresh"))
            .json(&serde_json::json!({ "token": refresh_token.expose_secret() }));
        let envelope: RefreshEnvelope = decode(self.send(request).await?).await?;

        envelope
            .into_access_token()
            .map(SecretString::from)
            .ok_or_else(|| ApiError::invalid("refresh response has no access token"))
    }

    /// One page of accounts for the admin users screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn list_users(
        &self,
        credentials: &Credentials,
        filter: &UserFilter,
    ) -> Result<UserPage> {
        let url = self.endpoint("/auth/getall");
        let query = filter.query();
        let response = self
            .send_authed(credentials, |client| client.get(&url).query(&query))
            .await?;
        decode(response).await
    }

    /// Create an account with any role.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the account.
    #[instrument(skip(self, credentials, input), fields(email = %input.email))]
    pub async fn create_user(&self, credentials: &Credentials, input: &UserInput) -> Result<()> {
        let url = self.endpoint("/auth/create");
        self.send_authed(credentials, |client| client.post(&url).json(input))
            .await?;
        Ok(())
    }

    /// Update an account; a `None` password keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, credentials, input))]
    pub async fn update_user(
        &self,
        credentials: &Credentials,
        id: &UserId,
        input: &UserInput,
    ) -> Result<()> {
        let url = self.resource_endpoint("/auth/update", id)?;
        self.send_authed(credentials, |client| client.put(&url).json(input))
            .await?;
        Ok(())
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn delete_user(&self, credentials: &Credentials, id: &UserId) -> Result<()> {
        let url = self.resource_endpoint("/auth/delete", id)?;
        self.send_authed(credentials, |client| client.delete(&url))
            .await?;
        Ok(())
    }

    /// Flip an account between `ACTIVE` and `INACTIVE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn toggle_user_status(&self, credentials: &Credentials, id: &UserId) -> Result<()> {
        let url = self.resource_endpoint("/auth/status", id)?;
        self.send_authed(credentials, |client| client.patch(&url))
            .await?;
        Ok(())
    }
}
