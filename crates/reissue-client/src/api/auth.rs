//! Authentication API.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{LoginRequest, OAuthProfile, Session, SignupRequest, TokenPair};

/// Authentication API client.
///
/// Every call that yields a token pair stores it, replacing the whole session.
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in with an account id and password.
    ///
    /// 400 (missing fields) surfaces as `Error::Api`, 404 (unknown account or
    /// wrong password) as `Error::NotFound`.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session> {
        let path = &self.client.endpoints().login;
        let tokens: TokenPair = self.client.post(path, request).await?;
        self.store_tokens(tokens, "login").await
    }

    /// Register an account.
    pub async fn signup(&self, request: &SignupRequest) -> Result<Session> {
        let path = &self.client.endpoints().signup;
        let tokens: TokenPair = self.client.post(path, request).await?;
        self.store_tokens(tokens, "signup").await
    }

    /// Exchange an identity obtained from an OAuth provider for a session.
    pub async fn oauth_login(&self, profile: &OAuthProfile) -> Result<Session> {
        let path = &self.client.endpoints().oauth_login;
        let tokens: TokenPair = self.client.post(path, profile).await?;
        self.store_tokens(tokens, "oauth login").await
    }

    /// Forget the stored session.
    pub async fn logout(&self) -> Result<()> {
        self.client.store().clear_session().await?;
        tracing::info!("session cleared");
        Ok(())
    }

    /// Read the stored session.
    pub async fn session(&self) -> Result<Session> {
        self.client.session().await
    }

    async fn store_tokens(&self, tokens: TokenPair, via: &str) -> Result<Session> {
        self.client.store().save_session(&tokens).await?;
        tracing::info!(via, "session stored");
        Ok(Session::from(tokens))
    }
}
