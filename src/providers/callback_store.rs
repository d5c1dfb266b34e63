use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ProviderError;

/// How long an authorization request may wait for its callback.
pub const PENDING_TTL_SECONDS: i64 = 60 * 60;

/// An authorization request that was sent and has not been answered yet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub state: String,
    pub redirect_uri: String,
    /// PKCE secret; only its S256 challenge leaves this process.
    pub code_verifier: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl PendingAuthorization {
    /// A fresh request with random `state` and PKCE verifier.
    pub fn generate(redirect_uri: &str) -> Self {
        let code_verifier = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        Self {
            state: uuid::Uuid::new_v4().to_string(),
            redirect_uri: redirect_uri.to_string(),
            code_verifier,
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn code_challenge(&self) -> String {
        code_challenge(&self.code_verifier)
    }

    fn is_expired(&self, now: i64) -> bool {
        now - self.created_at > PENDING_TTL_SECONDS
    }
}

/// `BASE64URL(SHA256(verifier))`, the S256 PKCE transform.
pub fn code_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Keeps pending authorization requests across the redirect to the provider
/// and back, keyed by `state`.
pub trait CallbackStore: Send + Sync {
    fn add(&self, pending: PendingAuthorization) -> Result<(), ProviderError>;

    /// Removes and returns the request issued with `state`. Expired requests
    /// are never returned.
    fn take(&self, state: &str) -> Result<Option<PendingAuthorization>, ProviderError>;
}

type Entries = HashMap<String, PendingAuthorization>;

fn prune(entries: &mut Entries) {
    let now = Utc::now().timestamp();
    entries.retain(|_, pending| !pending.is_expired(now));
}

/// Callback store that lives as long as the process.
#[derive(Default)]
pub struct MemoryCallbackStore {
    entries: Mutex<Entries>,
}

impl MemoryCallbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CallbackStore for MemoryCallbackStore {
    fn add(&self, pending: PendingAuthorization) -> Result<(), ProviderError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut entries);
        entries.insert(pending.state.clone(), pending);
        Ok(())
    }

    fn take(&self, state: &str) -> Result<Option<PendingAuthorization>, ProviderError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut entries);
        Ok(entries.remove(state))
    }
}

/// Callback store kept in a JSON file, so a request started by one run of the
/// binary can be completed by the next.
pub struct FileCallbackStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCallbackStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Entries, ProviderError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => {
                return Err(ProviderError::storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            ProviderError::storage(format!("Corrupt callback store {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, entries: &Entries) -> Result<(), ProviderError> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| ProviderError::storage(format!("Failed to encode callback store: {}", e)))?;
        std::fs::write(&self.path, bytes).map_err(|e| {
            ProviderError::storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl CallbackStore for FileCallbackStore {
    fn add(&self, pending: PendingAuthorization) -> Result<(), ProviderError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        prune(&mut entries);
        entries.insert(pending.state.clone(), pending);
        debug!(path = %self.path.display(), pending = entries.len(), "saved authorization request");
        self.save(&entries)
    }

    fn take(&self, state: &str) -> Result<Option<PendingAuthorization>, ProviderError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        let before = entries.len();
        prune(&mut entries);
        let taken = entries.remove(state);
        if taken.is_some() || entries.len() != before {
            self.save(&entries)?;
        }
        Ok(taken)
    }
}
