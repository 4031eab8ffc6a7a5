//! Bearer token acquisition.
//!
//! Two grants are supported and the choice is fixed for the lifetime of a
//! provider:
//! - `app`: the vendor client-credentials variant, posting
//!   `{client_id, client_secret, grant_type: "app"}` as JSON;
//! - stored `refresh_token`: seeded with an access/refresh pair issued out of
//!   band, marked as already expired so the first request verifies it with a
//!   refresh.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::token::{Token, TokenResponse};
use crate::config::vehicles::{Credentials, Tokens};
use crate::errors::VehicleError;
use crate::helpers::time::now_utc;
use crate::observability::metrics::get_metrics;

pub const GRANT_APP: &str = "app";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

#[derive(Debug, Clone)]
pub enum TokenProvider {
    App(AppGrant),
    Stored(StoredGrant),
}

impl TokenProvider {
    /// Stored grant when a complete token pair is configured, app grant otherwise
    pub fn from_config(client: Client, token_uri: &str, credentials: &Credentials, tokens: Option<&Tokens>) -> Self {
        match tokens.filter(|t| t.is_complete()) {
            Some(tokens) => TokenProvider::Stored(StoredGrant::new(client, token_uri, credentials, tokens)),
            None => TokenProvider::App(AppGrant::new(client, token_uri, credentials)),
        }
    }

    pub fn grant(&self) -> &'static str {
        match self {
            TokenProvider::App(_) => GRANT_APP,
            TokenProvider::Stored(_) => GRANT_REFRESH_TOKEN,
        }
    }

    /// Token the transport starts with. Never valid, so the first request refreshes.
    pub fn initial_token(&self) -> Token {
        match self {
            TokenProvider::App(_) => Token::default(),
            TokenProvider::Stored(s) => s.seed.clone(),
        }
    }

    pub async fn obtain_token(&self, previous: &Token) -> Result<Token, VehicleError> {
        let metrics = get_metrics().await;
        let grant = self.grant();
        metrics.token_refreshes.with_label_values(&[grant]).inc();
        debug!(grant, "obtaining token");

        let result = match self {
            TokenProvider::App(s) => s.obtain_token().await,
            TokenProvider::Stored(s) => s.obtain_token(previous).await,
        };

        result.inspect_err(|err| {
            warn!(grant, error = %err, "token refresh failed");
            metrics.token_refresh_failures.with_label_values(&[grant]).inc();
        })
    }
}

#[derive(Serialize)]
struct AppGrantRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Clone)]
pub struct AppGrant {
    client: Client,
    token_uri: String,
    credentials: Credentials,
}

impl AppGrant {
    pub fn new(client: Client, token_uri: &str, credentials: &Credentials) -> Self {
        Self {
            client,
            token_uri: token_uri.to_owned(),
            credentials: credentials.clone(),
        }
    }

    pub async fn obtain_token(&self) -> Result<Token, VehicleError> {
        let body = AppGrantRequest {
            client_id: &self.credentials.id,
            client_secret: &self.credentials.secret,
            grant_type: GRANT_APP,
        };
        request_token(self.client.post(&self.token_uri).json(&body)).await
    }
}

#[derive(Debug, Clone)]
pub struct StoredGrant {
    client: Client,
    token_uri: String,
    credentials: Credentials,
    seed: Token,
}

impl StoredGrant {
    pub fn new(client: Client, token_uri: &str, credentials: &Credentials, tokens: &Tokens) -> Self {
        let seed = Token::new(
            tokens.access.clone(),
            Some(tokens.refresh.clone()),
            Some(now_utc()),
        );
        Self {
            client,
            token_uri: token_uri.to_owned(),
            credentials: credentials.clone(),
            seed,
        }
    }

    /// Standard refresh-token exchange, client credentials sent in the form body
    pub async fn obtain_token(&self, previous: &Token) -> Result<Token, VehicleError> {
        let refresh_token = previous
            .refresh_token
            .as_ref()
            .or(self.seed.refresh_token.as_ref())
            .cloned()
            .ok_or_else(|| VehicleError::Auth("no refresh token available".to_owned()))?;

        let form = [
            ("grant_type", GRANT_REFRESH_TOKEN),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.credentials.id.as_str()),
            ("client_secret", self.credentials.secret.as_str()),
        ];
        let mut token = request_token(self.client.post(&self.token_uri).form(&form)).await?;

        // upstream may not rotate the refresh token
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token);
        }
        Ok(token)
    }
}

async fn request_token(request: RequestBuilder) -> Result<Token, VehicleError> {
    let response = request
        .send()
        .await
        .map_err(|e| VehicleError::Auth(format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VehicleError::Auth(format!(
            "token endpoint returned {}: {}",
            status,
            body.trim()
        )));
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| VehicleError::Auth(format!("token response decode failed: {}", e)))?
        .into_token();

    if token.access_token.is_empty() {
        return Err(VehicleError::Auth("token endpoint returned an empty access token".to_owned()));
    }
    Ok(token)
}
