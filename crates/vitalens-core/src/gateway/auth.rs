//! Auth gateway
//!
//! Talks to the `/auth/*` endpoints. The gateway never writes the credential
//! store; persisting a fresh token pair is the session's job.

use super::client::{classify, server_error, ApiClient};
use super::transport::{HttpRequest, HttpResponse};
use crate::error::{Error, Result};
use crate::models::{LoginRequest, RefreshTokenRequest, RegisterRequest, TokenResponse, UserProfile};

const REGISTER_PATH: &str = "/auth/register";
const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";
const ME_PATH: &str = "/auth/me";

#[derive(Debug, Clone)]
pub struct AuthGateway {
    client: ApiClient,
}

impl AuthGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Create an account; does not log in
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        log::info!("[auth] Registering '{}'", request.username);
        let response = self.post_json(REGISTER_PATH, request).await?;
        classify(response)
    }

    /// Exchange credentials for a token pair
    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        log::info!("[auth] Logging in '{}'", request.username_or_email);
        let response = self.post_json(LOGIN_PATH, request).await?;
        classify(response)
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        log::debug!("[auth] Refreshing access token");
        let request = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response = self.post_json(REFRESH_PATH, &request).await?;
        classify(response)
    }

    /// Invalidate the stored access token on the server
    ///
    /// Without a stored token there is nothing to revoke and no call is made.
    /// A 401 means the token was already invalid and also counts as success.
    pub async fn logout(&self) -> Result<()> {
        let url = self.client.endpoint(LOGOUT_PATH, &[])?;

        let Some(token) = self.client.access_token() else {
            log::debug!("[auth] No access token, skipping remote logout");
            return Ok(());
        };

        let response = self
            .client
            .send(HttpRequest::post(url).bearer(&token))
            .await?;

        if response.is_success() || response.status == 401 {
            log::info!("[auth] Logged out (status {})", response.status);
            Ok(())
        } else {
            Err(server_error(&response))
        }
    }

    /// Profile of the account owning the stored access token
    pub async fn get_current_user(&self) -> Result<UserProfile> {
        let url = self.client.endpoint(ME_PATH, &[])?;
        let token = self.client.access_token().ok_or(Error::Unauthorized)?;

        let response = self.client.send(HttpRequest::get(url).bearer(&token)).await?;
        classify(response)
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpResponse> {
        let url = self.client.endpoint(path, &[])?;
        let request = HttpRequest::post(url)
            .json(body)
            .map_err(|e| Error::validation(format!("Failed to encode request: {}", e)))?;
        self.client.send(request).await
    }
}
