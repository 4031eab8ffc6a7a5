use http::header::AUTHORIZATION;
use http::{Method, StatusCode};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::provider::TokenProvider;
use crate::auth::token::Token;
use crate::errors::VehicleError;

/// Http client that attaches the current bearer token to every request.
///
/// The token slot lock is held while the provider refreshes, so overlapping
/// requests wait for one refresh instead of starting their own.
pub struct AuthorizedClient {
    client: Client,
    provider: TokenProvider,
    token: Mutex<Token>,
}

impl AuthorizedClient {
    pub fn new(client: Client, provider: TokenProvider) -> Self {
        let token = Mutex::new(provider.initial_token());
        Self { client, provider, token }
    }

    pub fn grant(&self) -> &'static str {
        self.provider.grant()
    }

    /// Valid token, refreshed through the provider when needed
    pub async fn token(&self) -> Result<Token, VehicleError> {
        let mut current = self.token.lock().await;
        if !current.is_valid() {
            let refreshed = self.provider.obtain_token(&current).await?;
            debug!(grant = self.provider.grant(), expires_at = ?refreshed.expires_at, "token refreshed");
            *current = refreshed;
        }
        Ok(current.clone())
    }

    /// Drop the access token unless a concurrent request already replaced it
    async fn invalidate(&self, rejected: &Token) {
        let mut current = self.token.lock().await;
        if current.access_token == rejected.access_token {
            current.access_token.clear();
        }
    }

    /// Send with bearer auth; a 401 refreshes the token and retries exactly once.
    pub async fn send(&self, method: Method, url: &str) -> Result<Response, VehicleError> {
        let token = self.token().await?;
        let response = self.execute(method.clone(), url, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(url, "request rejected with 401, refreshing token and retrying once");
        self.invalidate(&token).await;
        let token = self.token().await?;
        self.execute(method, url, &token).await
    }

    async fn execute(&self, method: Method, url: &str, token: &Token) -> Result<Response, VehicleError> {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, token.authorization())
            .send()
            .await
            .map_err(VehicleError::from)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, VehicleError> {
        let response = ensure_success(self.send(Method::GET, url).await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| VehicleError::Decode(format!("{}: {}", url, e)))
    }

    /// Bare POST without a body
    pub async fn post_empty(&self, url: &str) -> Result<(), VehicleError> {
        ensure_success(self.send(Method::POST, url).await?).await.map(|_| ())
    }
}

async fn ensure_success(response: Response) -> Result<Response, VehicleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(VehicleError::upstream(
        Some(status.as_u16()),
        format!("{} {}: {}", status, url, body.trim()),
    ))
}
