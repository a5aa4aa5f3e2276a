//! Shared HTTP client for the backend API.
//!
//! All requests are authenticated with the opaque `session_id` cookie the
//! backend hands out at login. The token itself lives in the OS keyring;
//! the client never interprets it.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::keyring_store;
use crate::error::ApiError;

pub(crate) const SESSION_TOKEN_KEY: &str = "session_id";

/// Base client carrying the backend URL and the session token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    session_token: Option<String>,
}

impl ApiClient {
    /// Create a client, loading the session token from the OS keyring
    /// (absent token means unauthenticated -- requests will fail with
    /// [`ApiError::NotAuthenticated`]).
    pub fn new(base_url: Url) -> Self {
        let session_token = keyring_store::get(SESSION_TOKEN_KEY).ok().flatten();
        Self::build(base_url, session_token)
    }

    /// Create a client with an explicit session token (used by tests and
    /// right after login, before the keyring write is re-read).
    pub fn with_token(base_url: Url, token: impl Into<String>) -> Self {
        Self::build(base_url, Some(token.into()))
    }

    fn build(base_url: Url, session_token: Option<String>) -> Self {
        Self {
            base_url,
            http: Client::new(),
            session_token,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_token.is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self
            .session_token
            .as_deref()
            .ok_or(ApiError::NotAuthenticated)?;
        Ok(req.header(reqwest::header::COOKIE, format!("session_id={token}")))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.authed(self.http.get(self.endpoint(path)))?;
        Self::decode(Self::check(req.send().await?).await?).await
    }

    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.authed(self.http.post(self.endpoint(path)).json(body))?;
        Self::decode(Self::check(req.send().await?).await?).await
    }

    pub(crate) async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.authed(self.http.patch(self.endpoint(path)).json(body))?;
        Self::decode(Self::check(req.send().await?).await?).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let req = self.authed(self.http.delete(self.endpoint(path)))?;
        Self::check(req.send().await?).await?;
        Ok(())
    }

    /// POST without the session cookie (login, registration).
    pub(crate) async fn post_unauthenticated<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let resp = self.http.post(self.endpoint(path)).json(body).send().await?;
        Self::check(resp).await
    }

    /// Map non-2xx responses to [`ApiError::Status`], pulling the backend's
    /// `{"detail": ...}` message out of the body when present.
    async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("detail").map(|d| match d.as_str() {
                    Some(s) => s.to_string(),
                    None => d.to_string(),
                })
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
