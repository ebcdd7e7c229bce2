use super::auth::{self, OAuthClient};
use crate::components::storage::Store;
use crate::error::{auth_error, DaybookResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Google OAuth token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed early
const EXPIRY_SKEW_SECS: i64 = 60;

/// Stored credential record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    pub expires_at: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl Token {
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_SKEW_SECS > now
    }
}

/// Response body of the token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Turn into a stored token, keeping `previous_refresh` when Google omits one
    pub(crate) fn into_token(self, previous_refresh: Option<String>) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Utc::now().timestamp() + self.expires_in.unwrap_or(3600),
            scope: self.scope,
        }
    }
}

/// Hands out access tokens, refreshing or re-authorizing when needed
#[derive(Clone)]
pub struct TokenManager {
    oauth: OAuthClient,
    store: Arc<dyn Store>,
    key: String,
    client: Client,
}

impl TokenManager {
    pub fn new(oauth: OAuthClient, store: Arc<dyn Store>, key: impl Into<String>) -> Self {
        Self {
            oauth,
            store,
            key: key.into(),
            client: Client::new(),
        }
    }

    /// Get a usable access token
    pub async fn get_access_token(&self) -> DaybookResult<String> {
        let token = match self.load_token()? {
            Some(token) if token.is_valid_at(Utc::now().timestamp()) => token,
            Some(token) => match token.refresh_token.clone() {
                Some(refresh_token) => match self.refresh_token(&refresh_token).await {
                    Ok(token) => token,
                    Err(e) => {
                        warn!("Token refresh failed, authorizing again: {}", e);
                        self.authorize().await?
                    }
                },
                None => self.authorize().await?,
            },
            None => self.authorize().await?,
        };

        Ok(token.access_token)
    }

    /// Read the stored token; an unreadable record is treated as absent
    pub fn load_token(&self) -> DaybookResult<Option<Token>> {
        let Some(bytes) = self.store.load(&self.key)? else {
            return Ok(None);
        };

        match serde_json::from_slice::<Token>(&bytes) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!("Ignoring unreadable credential record: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist a token
    pub fn set_token(&self, token: &Token) -> DaybookResult<()> {
        let json = serde_json::to_vec_pretty(token)?;
        self.store.save(&self.key, &json)
    }

    /// Exchange a refresh token for a new access token
    async fn refresh_token(&self, refresh_token: &str) -> DaybookResult<Token> {
        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        let token = body.into_token(Some(refresh_token.to_string()));
        self.set_token(&token)?;
        info!("Refreshed Google Calendar access token");

        Ok(token)
    }

    /// Run the interactive flow and store the result
    pub async fn authorize(&self) -> DaybookResult<Token> {
        let token = auth::run_installed_flow(&self.oauth, &self.client).await?;
        self.set_token(&token)?;
        info!("Stored new Google Calendar credentials");
        Ok(token)
    }
}
