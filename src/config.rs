//! Client configuration: env-var driven with sensible defaults, the same
//! merge order the binaries use (flag > env > default).

use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_TIMEOUT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Fallback when `FITGATE_ENV` is unset: release builds are production.
    pub fn from_build() -> Self {
        if cfg!(debug_assertions) { Environment::Development } else { Environment::Production }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(Environment::Development),
            "prod" | "production" => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool { matches!(self, Environment::Production) }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, e.g. `http://localhost:4000/api`.
    pub api_url: String,
    /// Root directory for the durable credential store.
    pub data_dir: PathBuf,
    pub environment: Environment,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:4000/api".into(),
            data_dir: PathBuf::from(".fitgate"),
            environment: Environment::from_build(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Environment variables: `FITGATE_API_URL`, `FITGATE_DATA_DIR`,
    /// `FITGATE_ENV` (dev|development|prod|production).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = std::env::var("FITGATE_API_URL") {
            if !url.trim().is_empty() { cfg.api_url = url; }
        }
        if let Ok(dir) = std::env::var("FITGATE_DATA_DIR") {
            if !dir.trim().is_empty() { cfg.data_dir = PathBuf::from(dir); }
        }
        if let Ok(env) = std::env::var("FITGATE_ENV") {
            if let Some(parsed) = Environment::parse(&env) { cfg.environment = parsed; }
        }
        cfg
    }
}
