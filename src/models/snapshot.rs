use serde::{Deserialize, Serialize};

/// Point-in-time view of the authentication state.
///
/// When `is_authenticated` is false both tokens are expected to be `None`.
/// The store replaces snapshots whole; it never patches a single field.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_authenticated: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl AuthSnapshot {
    pub fn new(
        is_authenticated: bool,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        AuthSnapshot {
            is_authenticated,
            access_token,
            refresh_token,
        }
    }

    /// The signed-out snapshot, `{false, None, None}`.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// True when the snapshot respects the "no tokens while signed out" rule.
    pub fn is_consistent(&self) -> bool {
        self.is_authenticated || (self.access_token.is_none() && self.refresh_token.is_none())
    }
}
