//! Remote identity endpoint client. The backend is a narrow contract:
//! `POST /auth/login`, `POST /auth/register`, `GET /auth/me` (bearer), each
//! answering `{success, token, user} | {success:false, error}`. Everything
//! here maps transport/status outcomes onto the error taxonomy; nothing here
//! touches session state.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;

/// Bound on every network call. A timeout is a `NetworkFailure`, never a 401,
/// so it can never force a logout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam between the session manager and the backend. Implemented over HTTP in
/// production and by scripted mocks in tests.
#[allow(async_fn_in_trait)]
pub trait IdentityApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> AuthResult<(String, Identity)>;
    async fn register(&self, username: &str, email: &str, password: &str) -> AuthResult<(String, Identity)>;
    async fn me(&self, token: &str) -> AuthResult<Identity>;
}

impl<T: IdentityApi> IdentityApi for std::sync::Arc<T> {
    async fn login(&self, email: &str, password: &str) -> AuthResult<(String, Identity)> {
        (**self).login(email, password).await
    }
    async fn register(&self, username: &str, email: &str, password: &str) -> AuthResult<(String, Identity)> {
        (**self).register(username, email, password).await
    }
    async fn me(&self, token: &str) -> AuthResult<Identity> {
        (**self).me(token).await
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<Identity>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct HttpIdentityApi {
    base: Url,
    client: reqwest::Client,
}

impl HttpIdentityApi {
    pub fn new(base: &str) -> Result<Self> { Self::with_timeout(base, DEFAULT_TIMEOUT) }

    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base.ends_with('/') { base.to_string() } else { format!("{base}/") };
        let base = Url::parse(&normalized).context("invalid api base URL")?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url { &self.base }

    fn endpoint(&self, path: &str) -> AuthResult<Url> {
        self.base.join(path).map_err(|e| AuthError::network(format!("bad endpoint {path}: {e}")))
    }

    async fn credential_exchange(&self, path: &str, payload: serde_json::Value) -> AuthResult<(String, Identity)> {
        let url = self.endpoint(path)?;
        let resp = self.client.post(url).json(&payload).send().await.map_err(map_transport)?;
        let status = resp.status();
        let envelope: AuthEnvelope = resp.json().await.unwrap_or_default();
        if status.is_success() && envelope.success {
            match (envelope.token, envelope.user) {
                (Some(token), Some(user)) => return Ok((token, user)),
                _ => return Err(AuthError::server("malformed auth response: token or user missing")),
            }
        }
        Err(classify_failure(status, envelope.error))
    }
}

impl IdentityApi for HttpIdentityApi {
    async fn login(&self, email: &str, password: &str) -> AuthResult<(String, Identity)> {
        self.credential_exchange("auth/login", serde_json::json!({"email": email, "password": password})).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> AuthResult<(String, Identity)> {
        self.credential_exchange(
            "auth/register",
            serde_json::json!({"username": username, "email": email, "password": password}),
        )
        .await
    }

    async fn me(&self, token: &str) -> AuthResult<Identity> {
        let url = self.endpoint("auth/me")?;
        let resp = self.client.get(url).bearer_auth(token).send().await.map_err(map_transport)?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::unauthorized("credential rejected by identity endpoint"));
        }
        let envelope: AuthEnvelope = resp.json().await.unwrap_or_default();
        if status.is_success() && envelope.success {
            return envelope.user.ok_or_else(|| AuthError::server("malformed auth response: user missing"));
        }
        Err(classify_failure(status, envelope.error))
    }
}

fn map_transport(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::network("request timed out")
    } else {
        AuthError::network(e.to_string())
    }
}

/// Status → taxonomy mapping shared by all three endpoints.
fn classify_failure(status: StatusCode, body_error: Option<String>) -> AuthError {
    let msg = body_error.unwrap_or_else(|| format!("request failed: HTTP {status}"));
    if status == StatusCode::UNAUTHORIZED {
        AuthError::unauthorized(msg)
    } else if status.is_client_error() || status.is_success() {
        // 200 with success:false is the backend's inline-rejection shape
        AuthError::invalid_credentials(msg)
    } else {
        AuthError::server(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_fields() {
        let env: AuthEnvelope = serde_json::from_str(r#"{"success": false, "error": "nope"}"#).unwrap();
        assert!(!env.success);
        assert_eq!(env.error.as_deref(), Some("nope"));
        assert!(env.token.is_none() && env.user.is_none());
    }

    #[test]
    fn envelope_full_success() {
        let env: AuthEnvelope = serde_json::from_str(
            r#"{"success": true, "token": "t1", "user": {"id": 3, "username": "ade", "role": "admin"}}"#,
        )
        .unwrap();
        assert!(env.success);
        assert_eq!(env.token.as_deref(), Some("t1"));
        assert!(env.user.unwrap().is_admin());
    }

    #[test]
    fn failure_classification() {
        assert!(classify_failure(StatusCode::UNAUTHORIZED, None).is_unauthorized());
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST, Some("wrong password".into())).code_str(),
            "invalid_credentials"
        );
        assert_eq!(classify_failure(StatusCode::OK, None).code_str(), "invalid_credentials");
        assert_eq!(classify_failure(StatusCode::BAD_GATEWAY, None).code_str(), "server_error");
        assert_eq!(classify_failure(StatusCode::INTERNAL_SERVER_ERROR, None).code_str(), "server_error");
    }

    #[test]
    fn endpoint_joins_relative_to_base() {
        let api = HttpIdentityApi::new("http://localhost:4000/api").unwrap();
        assert_eq!(api.endpoint("auth/login").unwrap().as_str(), "http://localhost:4000/api/auth/login");
    }
}
