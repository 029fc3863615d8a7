use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::error::AuthError;
use crate::models::{Identity, Session};
use crate::platform::PlatformClient;
use crate::services::AuthProvider;

/// Auth endpoints of the hosted platform
pub struct PlatformAuth {
    client: PlatformClient,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    user: Identity,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            identity: token.user,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
        }
    }
}

impl PlatformAuth {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthProvider for PlatformAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let token: TokenResponse = self.client.send_json(request).await?;
        Ok(token.into())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/signup", None)
            .json(&json!({ "email": email, "password": password }));

        // The body is either the unconfirmed user or, with auto-confirm enabled, a
        // session; either way the user has to confirm and sign in again
        self.client.send(request).await?;
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/logout", Some(access_token));
        self.client.send(request).await?;
        Ok(())
    }

    async fn current_identity(&self, access_token: &str) -> Result<Identity, AuthError> {
        let request = self
            .client
            .request(Method::GET, "/auth/v1/user", Some(access_token));
        let identity: Identity = self.client.send_json(request).await?;
        Ok(identity)
    }
}
