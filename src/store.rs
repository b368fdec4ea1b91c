//! Durable credential persistence: two keys, `token` and `user.json`, under a
//! root directory. Pure persistence shim — no network or validation logic;
//! the session manager is the only writer and is always at least as fresh as
//! what lives here.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

use crate::error::AuthResult;
use crate::identity::Identity;

const TOKEN_FILE: &str = "token";
const IDENTITY_FILE: &str = "user.json";

/// What a cold start finds on disk. A token without a parseable cached
/// identity is still returned — untrusted until verification succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub token: String,
    pub identity: Option<Identity>,
}

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<StoredCredential>;
    fn save(&self, token: &str, identity: &Identity) -> AuthResult<()>;
    fn clear(&self) -> AuthResult<()>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    fn load(&self) -> Option<StoredCredential> { (**self).load() }
    fn save(&self, token: &str, identity: &Identity) -> AuthResult<()> { (**self).save(token, identity) }
    fn clear(&self) -> AuthResult<()> { (**self).clear() }
}

/// File-backed store rooted at a data directory.
pub struct FileCredentialStore {
    root: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self { Self { root: root.as_ref().to_path_buf() } }

    pub fn root(&self) -> &Path { &self.root }

    fn token_path(&self) -> PathBuf { self.root.join(TOKEN_FILE) }
    fn identity_path(&self) -> PathBuf { self.root.join(IDENTITY_FILE) }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<StoredCredential> {
        let token = fs::read_to_string(self.token_path()).ok()?;
        let token = token.trim().to_string();
        if token.is_empty() { return None; }
        let identity = fs::read_to_string(self.identity_path())
            .ok()
            .and_then(|s| serde_json::from_str::<Identity>(&s).ok());
        Some(StoredCredential { token, identity })
    }

    fn save(&self, token: &str, identity: &Identity) -> AuthResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.token_path(), token)?;
        let json = serde_json::to_string(identity).map_err(|e| crate::error::AuthError::storage(e.to_string()))?;
        fs::write(self.identity_path(), json)?;
        Ok(())
    }

    fn clear(&self) -> AuthResult<()> {
        for p in [self.token_path(), self.identity_path()] {
            if let Err(e) = fs::remove_file(&p) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(target: "fitgate::store", "failed to remove {}: {}", p.display(), e);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral embedding.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self { Self::default() }

    pub fn seed(token: &str, identity: Option<Identity>) -> Self {
        Self { inner: RwLock::new(Some(StoredCredential { token: token.to_string(), identity })) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<StoredCredential> { self.inner.read().clone() }

    fn save(&self, token: &str, identity: &Identity) -> AuthResult<()> {
        *self.inner.write() = Some(StoredCredential { token: token.to_string(), identity: Some(identity.clone()) });
        Ok(())
    }

    fn clear(&self) -> AuthResult<()> {
        *self.inner.write() = None;
        Ok(())
    }
}
