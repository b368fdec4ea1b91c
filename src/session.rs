//! Session manager: the single owner of client-side authentication state.
//! Reconciles the durable credential store with the remote identity endpoint
//! and exposes read-only snapshots to everything else. Mutations are
//! serialized through one lock; async completions are epoch-tagged so a
//! logout issued while a login or cold-start verification is in flight always
//! wins, and the late completion is discarded instead of applied.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::api::IdentityApi;
use crate::error::AuthResult;
use crate::identity::{Freshness, Identity, IdentityPatch, Role};
use crate::store::CredentialStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Verification in flight or not yet attempted.
    Loading,
    Authenticated { identity: Identity, freshness: Freshness },
    Anonymous,
}

/// Read contract handed to the guard, the nav dispatcher and business
/// screens. Cheap to clone; taken under the lock at a single instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub freshness: Option<Freshness>,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub is_admin: bool,
}

impl Session {
    /// Effective privilege class; an anonymous or loading session is a guest.
    pub fn role(&self) -> Role {
        self.identity.as_ref().map(|i| i.role).unwrap_or(Role::Guest)
    }
}

struct Inner {
    state: SessionState,
    token: Option<String>,
}

pub struct SessionManager<S, A> {
    store: S,
    api: A,
    inner: RwLock<Inner>,
    epoch: AtomicU64,
}

impl<S: CredentialStore, A: IdentityApi> SessionManager<S, A> {
    pub fn new(store: S, api: A) -> Self {
        Self {
            store,
            api,
            inner: RwLock::new(Inner { state: SessionState::Loading, token: None }),
            epoch: AtomicU64::new(1),
        }
    }

    /// Cold-start reconciliation against the durable store. Synchronous and
    /// network-free. Returns true when a verification pass should follow:
    /// - no stored token: settle to `Anonymous`, nothing to verify;
    /// - token + cached identity: optimistic `Authenticated(Cached)` for
    ///   immediate UI, verification pending;
    /// - token without a usable cached identity: stay `Loading` until the
    ///   endpoint answers.
    pub fn hydrate(&self) -> bool {
        match self.store.load() {
            None => {
                let mut g = self.inner.write();
                g.state = SessionState::Anonymous;
                g.token = None;
                self.epoch.fetch_add(1, Ordering::Relaxed);
                debug!(target: "fitgate::session", "no stored credential, session settled anonymous");
                false
            }
            Some(cred) => {
                let mut g = self.inner.write();
                g.token = Some(cred.token);
                if let Some(identity) = cred.identity {
                    debug!(target: "fitgate::session", "restored cached identity user={}", identity.username);
                    g.state = SessionState::Authenticated { identity, freshness: Freshness::Cached };
                }
                self.epoch.fetch_add(1, Ordering::Relaxed);
                true
            }
        }
    }

    /// Hydrate and, when a credential was found, run the verification pass to
    /// completion. Hosts that want background verification wrap the manager
    /// in an `Arc` and spawn `refresh_identity` themselves.
    pub async fn start(&self) -> Session {
        if self.hydrate() {
            self.refresh_identity().await
        } else {
            self.snapshot()
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Session> {
        let started = self.epoch.load(Ordering::Relaxed);
        let (token, identity) = self.api.login(email, password).await?;
        self.commit_credential(started, token, identity, "login");
        Ok(self.snapshot())
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> AuthResult<Session> {
        let started = self.epoch.load(Ordering::Relaxed);
        let (token, identity) = self.api.register(username, email, password).await?;
        self.commit_credential(started, token, identity, "register");
        Ok(self.snapshot())
    }

    /// Clears the store and the in-memory identity and settles `Anonymous`.
    /// Idempotent; also bumps the epoch so any in-flight login or
    /// verification completion lands stale and is discarded.
    pub fn logout(&self) {
        {
            let mut g = self.inner.write();
            let was_active = !matches!(g.state, SessionState::Anonymous);
            g.state = SessionState::Anonymous;
            g.token = None;
            self.epoch.fetch_add(1, Ordering::Relaxed);
            if was_active {
                info!(target: "fitgate::session", "session ended");
            }
        }
        if let Err(e) = self.store.clear() {
            warn!(target: "fitgate::session", "failed to clear credential store: {e}");
        }
    }

    /// Shallow-merge a profile edit into the current identity and re-persist,
    /// without a verification round trip. No-op when not authenticated.
    pub fn update_identity(&self, patch: &IdentityPatch) -> Session {
        if patch.is_empty() {
            return self.snapshot();
        }
        let persisted = {
            let mut g = self.inner.write();
            if let SessionState::Authenticated { identity, .. } = &mut g.state {
                patch.apply(identity);
                self.epoch.fetch_add(1, Ordering::Relaxed);
                let identity = identity.clone();
                g.token.clone().map(|t| (t, identity))
            } else {
                None
            }
        };
        if let Some((token, identity)) = persisted {
            if let Err(e) = self.store.save(&token, &identity) {
                warn!(target: "fitgate::session", "failed to re-persist identity: {e}");
            }
        }
        self.snapshot()
    }

    /// Re-run the verification call. Success replaces the identity with the
    /// authoritative server copy; a 401 forces logout; any other failure
    /// keeps the current optimistic state. Never returns an error — callers
    /// observe the outcome through the returned snapshot.
    pub async fn refresh_identity(&self) -> Session {
        let started = self.epoch.load(Ordering::Relaxed);
        let token = { self.inner.read().token.clone() };
        let Some(token) = token else {
            // Nothing to verify; a still-loading session settles anonymous.
            let mut g = self.inner.write();
            if matches!(g.state, SessionState::Loading) {
                g.state = SessionState::Anonymous;
                self.epoch.fetch_add(1, Ordering::Relaxed);
            }
            drop(g);
            return self.snapshot();
        };
        match self.api.me(&token).await {
            Ok(identity) => {
                let applied = self.commit(started, |g| {
                    g.state = SessionState::Authenticated { identity: identity.clone(), freshness: Freshness::Verified };
                });
                if applied {
                    if let Err(e) = self.store.save(&token, &identity) {
                        warn!(target: "fitgate::session", "failed to persist verified identity: {e}");
                    }
                    info!(target: "fitgate::session", "identity verified user={}", identity.username);
                } else {
                    debug!(target: "fitgate::session", "discarding stale verification result");
                }
            }
            Err(e) if e.is_unauthorized() => {
                let superseded = self.epoch.load(Ordering::Relaxed) != started;
                if superseded {
                    debug!(target: "fitgate::session", "discarding stale 401");
                } else {
                    info!(target: "fitgate::session", "credential rejected, ending session");
                    self.logout();
                }
            }
            Err(e) => {
                // Resilience choice: a network blip never evicts a session.
                debug!(target: "fitgate::session", "verification failed, keeping session: {e}");
            }
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> Session {
        let g = self.inner.read();
        match &g.state {
            SessionState::Loading => Session {
                identity: None,
                freshness: None,
                is_loading: true,
                is_authenticated: false,
                is_admin: false,
            },
            SessionState::Anonymous => Session {
                identity: None,
                freshness: None,
                is_loading: false,
                is_authenticated: false,
                is_admin: false,
            },
            SessionState::Authenticated { identity, freshness } => Session {
                is_admin: identity.is_admin(),
                identity: Some(identity.clone()),
                freshness: Some(*freshness),
                is_loading: false,
                is_authenticated: true,
            },
        }
    }

    /// Current bearer token, for business calls made outside this engine.
    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    fn commit_credential(&self, started: u64, token: String, identity: Identity, op: &str) {
        let applied = self.commit(started, |g| {
            g.state = SessionState::Authenticated { identity: identity.clone(), freshness: Freshness::Verified };
            g.token = Some(token.clone());
        });
        if applied {
            // In-memory transition is decided first; the store mirrors it.
            if let Err(e) = self.store.save(&token, &identity) {
                warn!(target: "fitgate::session", "failed to persist credential: {e}");
            }
            info!(target: "fitgate::session", "{op} succeeded user={}", identity.username);
        } else {
            debug!(target: "fitgate::session", "discarding stale {op} completion");
        }
    }

    /// Apply a mutation only if no other mutation landed since `started`.
    /// The epoch is read and bumped under the write lock, so the check and
    /// the apply are a single atomic step.
    fn commit<F: FnOnce(&mut Inner)>(&self, started: u64, f: F) -> bool {
        let mut g = self.inner.write();
        if self.epoch.load(Ordering::Relaxed) != started {
            return false;
        }
        f(&mut g);
        self.epoch.fetch_add(1, Ordering::Relaxed);
        true
    }
}
