use tokio::sync::watch;
use tracing::debug;

use crate::models::AuthSnapshot;

/// Holder of the current [`AuthSnapshot`].
///
/// Writes go through the store value itself, which the session controller
/// owns. Everything else reads through an [`AuthStoreReader`].
pub struct AuthStore {
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthStore {
    /// Creates a store holding the signed-out snapshot.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::signed_out());
        AuthStore { tx }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    /// Replaces the snapshot in one step and notifies every reader.
    ///
    /// The store does not check the signed-out/no-tokens rule; callers do.
    pub fn set_auth(
        &self,
        is_authenticated: bool,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) {
        debug!(
            is_authenticated,
            has_access_token = access_token.is_some(),
            has_refresh_token = refresh_token.is_some(),
            "replacing auth snapshot"
        );
        self.tx.send_replace(AuthSnapshot::new(
            is_authenticated,
            access_token,
            refresh_token,
        ));
    }

    /// Resets to the signed-out snapshot.
    pub fn remove_auth(&self) {
        self.set_auth(false, None, None);
    }

    /// Hands out a read-only subscriber handle.
    pub fn reader(&self) -> AuthStoreReader {
        AuthStoreReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of an [`AuthStore`], cheap to clone and hand to UI code.
#[derive(Clone)]
pub struct AuthStoreReader {
    rx: watch::Receiver<AuthSnapshot>,
}

impl AuthStoreReader {
    /// Returns the latest snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.rx.borrow().clone()
    }

    /// True if the snapshot was replaced since this reader last looked.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Marks the current snapshot as seen and returns it.
    pub fn mark_seen(&mut self) -> AuthSnapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Waits for the next replacement and returns the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<AuthSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
