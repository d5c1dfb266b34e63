//! Session controller: the single owner of the provider handle and the only
//! writer of the auth store.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, info, warn};

use crate::config::RedirectTargets;
use crate::error::{AuthError, AuthResult};
use crate::models::AuthSnapshot;
use crate::providers::{InitOptions, LoginOptions, LoginOutcome, LogoutOptions, OnLoad, Provider};
use crate::store::{AuthStore, AuthStoreReader};

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;

/// Lifecycle of the provider session. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    /// The first initialization attempt has settled, successfully or not.
    Ready,
}

/// Mediates every interaction with the identity provider and keeps the
/// auth store in line with the provider's view of the session.
pub struct AuthSessionController {
    provider: Box<dyn Provider>,
    store: AuthStore,
    redirects: RedirectTargets,
    state: AtomicU8,
}

impl AuthSessionController {
    pub fn new(provider: Box<dyn Provider>, store: AuthStore, redirects: RedirectTargets) -> Self {
        info!(
            provider = provider.name(),
            post_login = redirects.post_login.as_str(),
            "Creating auth session controller"
        );
        Self {
            provider,
            store,
            redirects,
            state: AtomicU8::new(UNINITIALIZED),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            UNINITIALIZED => SessionState::Uninitialized,
            INITIALIZING => SessionState::Initializing,
            _ => SessionState::Ready,
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.store.snapshot()
    }

    /// Read-only store handle for UI code.
    pub fn reader(&self) -> AuthStoreReader {
        self.store.reader()
    }

    /// Sets up the provider session once and projects the result into the store.
    ///
    /// The latch is taken before the provider round-trip starts, so concurrent
    /// or repeated calls return `Ok(())` without contacting the provider. It is
    /// never released: a failed initialization is not retried.
    pub async fn initialize(&self) -> AuthResult<()> {
        if self
            .state
            .compare_exchange(UNINITIALIZED, INITIALIZING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Session already initialized; skipping provider init");
            return Ok(());
        }

        info!(provider = self.provider.name(), "Initializing provider session");
        let options = InitOptions {
            check_login_iframe: false,
            on_load: Some(OnLoad::CheckSso),
            silent_check_sso_redirect_uri: Some(self.redirects.silent_check_sso.clone()),
        };
        let result = self.provider.init(options).await;
        self.state.store(READY, Ordering::Release);

        let authenticated = result.map_err(|e| {
            warn!(provider = self.provider.name(), "Provider init failed: {}", e);
            AuthError::ProviderInit(e)
        })?;

        self.project(authenticated);
        info!(authenticated, "Provider session initialized");
        Ok(())
    }

    /// Starts an interactive login.
    ///
    /// On the normal path the user agent leaves for the provider and this
    /// returns [`LoginOutcome::Redirected`] with the store untouched.
    pub async fn login(&self) -> AuthResult<LoginOutcome> {
        let options = LoginOptions {
            redirect_uri: self.redirects.post_login.clone(),
        };
        let outcome = self.provider.login(options).await.map_err(|e| {
            warn!(provider = self.provider.name(), "Provider login failed: {}", e);
            AuthError::ProviderLogin(e)
        })?;

        match outcome {
            LoginOutcome::Redirected => debug!("Login handed off to the provider"),
            LoginOutcome::Completed => self.project(self.provider.authenticated()),
        }
        Ok(outcome)
    }

    /// Ends the provider session and clears the store.
    pub async fn logout(&self) -> AuthResult<()> {
        let options = LogoutOptions {
            redirect_uri: self.redirects.post_logout.clone(),
        };
        self.provider.logout(options).await.map_err(|e| {
            warn!(provider = self.provider.name(), "Provider logout failed: {}", e);
            AuthError::ProviderLogout(e)
        })?;

        self.store.remove_auth();
        info!("Logged out");
        Ok(())
    }

    /// Writes the provider's current tokens into the store. Tokens are only
    /// carried over for an authenticated session.
    fn project(&self, authenticated: bool) {
        if authenticated {
            self.store.set_auth(
                true,
                self.provider.token(),
                self.provider.refresh_token(),
            );
        } else {
            self.store.set_auth(false, None, None);
        }
    }
}
