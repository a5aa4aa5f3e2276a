//! Authentication boundary -- opaque cookie sessions.
//!
//! The backend issues a `session_id` cookie on login; we stash the token in
//! the OS keyring and attach it to every request. Nothing here inspects the
//! token or the user's credentials beyond relaying them once.

use serde::Serialize;

use super::client::{ApiClient, SESSION_TOKEN_KEY};
use super::keyring_store;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in and persist the issued session token to the keyring.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post_unauthenticated("auth/login", &LoginRequest { username, password })
            .await?;

        let token = session_cookie(&resp).ok_or_else(|| {
            ApiError::Decode("login response carried no session_id cookie".into())
        })?;

        keyring_store::set(SESSION_TOKEN_KEY, &token)
            .map_err(|e| ApiError::CredentialStore(e.to_string()))?;
        Ok(())
    }

    /// Log out server-side and drop the local token. The local token is
    /// removed even if the backend call fails -- the cookie would be dead
    /// weight at that point.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .client
            .post_json::<_, serde_json::Value>("auth/logout", &serde_json::json!({}))
            .await;

        keyring_store::delete(SESSION_TOKEN_KEY)
            .map_err(|e| ApiError::CredentialStore(e.to_string()))?;

        result.map(|_| ())
    }

    /// Whether a session token is stored locally. Does not validate it
    /// against the backend.
    pub fn is_logged_in(&self) -> bool {
        self.client.is_authenticated()
    }
}

/// Pull the `session_id` value out of the response's Set-Cookie headers.
fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            let (name_value, _attrs) = cookie.split_once(';').unwrap_or((cookie, ""));
            let (name, value) = name_value.split_once('=')?;
            (name.trim() == "session_id").then(|| value.trim().to_string())
        })
}
