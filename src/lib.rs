//! fitgate: client-resident session, identity and role-gated navigation
//! engine for the FitGate studio app. Establishes identity from a persisted
//! bearer credential, keeps it fresh against the remote identity endpoint,
//! and exposes the reconciled session to route guards and the navigation
//! chrome. Keep the public surface thin and split implementation across
//! focused modules.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod hardening;
pub mod identity;
pub mod nav;
pub mod session;
pub mod store;

pub use api::{HttpIdentityApi, IdentityApi};
pub use config::{ClientConfig, Environment};
pub use error::{AuthError, AuthResult};
pub use guard::{GuardDecision, RouteGuard};
pub use identity::{Freshness, Identity, IdentityPatch, Role};
pub use nav::{NavContext, NavVariant};
pub use session::{Session, SessionManager, SessionState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
