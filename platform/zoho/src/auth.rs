use std::{fmt, time::Duration};

use moka::future::Cache;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::{
    client::ZohoClient,
    error::{ZohoError, ZohoResult},
};

/// Short-lived bearer token for the CRM API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Tokens returned when an authorization code is exchanged.
#[derive(Clone, Debug)]
pub struct CodeGrant {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
    pub api_domain: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    api_domain: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> ZohoResult<AccessToken> {
        match self.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken(token)),
            _ => Err(ZohoError::Token(
                self.error.unwrap_or_else(|| "no access_token in response".into()),
            )),
        }
    }
}

impl ZohoClient {
    /// Exchange the configured refresh token for a new access token.
    pub async fn refresh_access_token(&self) -> ZohoResult<AccessToken> {
        let refresh_token = self
            .config
            .refresh_token
            .as_deref()
            .ok_or(ZohoError::MissingRefreshToken)?;
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let token = self.token_request(&params).await?.into_access_token()?;
        info!("obtained Zoho access token");
        Ok(token)
    }

    /// Browser URL where an operator grants offline access and receives a
    /// one-time authorization code on the redirect URI.
    pub fn authorization_url(&self, scope: &str) -> ZohoResult<Url> {
        let url = Url::parse_with_params(
            &self.config.auth_url(),
            &[
                ("scope", scope),
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Trade a one-time authorization code for a refresh token.
    pub async fn exchange_code(&self, code: &str) -> ZohoResult<CodeGrant> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];
        let mut response = self.token_request(&params).await?;
        let refresh_token = response.refresh_token.take();
        let api_domain = response.api_domain.take();
        let expires_in = response.expires_in;
        Ok(CodeGrant {
            access_token: response.into_access_token()?,
            refresh_token,
            api_domain,
            expires_in,
        })
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> ZohoResult<TokenResponse> {
        let response = self
            .http
            .post(self.config.token_url())
            .form(params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "token request rejected");
            return Err(ZohoError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

/// Access token memoized for a fixed window (thirty minutes by default).
#[derive(Clone, Debug)]
pub struct TokenCache {
    client: ZohoClient,
    tokens: Cache<(), AccessToken>,
}

impl TokenCache {
    pub fn new(client: ZohoClient, ttl: Duration) -> Self {
        Self {
            client,
            tokens: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Cached token, refreshing it when missing or expired. Concurrent callers
    /// share a single refresh; failures are not cached.
    pub async fn access_token(&self) -> ZohoResult<AccessToken> {
        self.tokens
            .try_get_with((), self.client.refresh_access_token())
            .await
            .map_err(|err| (*err).clone())
    }

    pub async fn invalidate(&self) {
        self.tokens.invalidate(&()).await;
    }
}
