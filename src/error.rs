//! Unified error model for the session engine.
//! Login/register failures are returned as values so callers can render
//! inline feedback; verification failures are handled internally by the
//! session manager and only ever surface as state transitions.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthError {
    /// Bad login/register payload. User-facing, recoverable by retry.
    InvalidCredentials { message: String },
    /// 401 from an authenticated call. Triggers forced logout, not shown as an error.
    Unauthorized { message: String },
    /// Transient transport failure (including timeouts). Session state preserved.
    NetworkFailure { message: String },
    /// 5xx from the backend. Surfaced as a generic failure, session state preserved.
    ServerError { message: String },
    /// Durable store read/write problem.
    Storage { message: String },
}

impl AuthError {
    pub fn invalid_credentials<S: Into<String>>(msg: S) -> Self { AuthError::InvalidCredentials { message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self { AuthError::Unauthorized { message: msg.into() } }
    pub fn network<S: Into<String>>(msg: S) -> Self { AuthError::NetworkFailure { message: msg.into() } }
    pub fn server<S: Into<String>>(msg: S) -> Self { AuthError::ServerError { message: msg.into() } }
    pub fn storage<S: Into<String>>(msg: S) -> Self { AuthError::Storage { message: msg.into() } }

    pub fn message(&self) -> &str {
        match self {
            AuthError::InvalidCredentials { message }
            | AuthError::Unauthorized { message }
            | AuthError::NetworkFailure { message }
            | AuthError::ServerError { message }
            | AuthError::Storage { message } => message.as_str(),
        }
    }

    /// The only error class that may force a session back to anonymous.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized { .. })
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials { .. } => "invalid_credentials",
            AuthError::Unauthorized { .. } => "unauthorized",
            AuthError::NetworkFailure { .. } => "network_failure",
            AuthError::ServerError { .. } => "server_error",
            AuthError::Storage { .. } => "storage",
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AuthError {}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Storage { message: err.to_string() }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Storage { message: err.to_string() }
    }
}
