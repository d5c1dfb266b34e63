use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::callback_store::CallbackStore;
use super::keycloak_provider::{KeycloakProvider, KeycloakProviderConfig};
use super::navigator::Navigator;
use crate::error::ProviderError;

/// Configuration options for the identity provider.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "keycloak")]
    Keycloak(KeycloakProviderConfig),
}

/// What `init` should do when no authorization callback is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnLoad {
    /// Detect an existing provider session without showing any login UI.
    CheckSso,
    /// Send the user to the login page unless already signed in.
    LoginRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    /// Poll the provider's session-status iframe after init.
    pub check_login_iframe: bool,
    pub on_load: Option<OnLoad>,
    /// Page the provider returns to when a silent check finishes.
    pub silent_check_sso_redirect_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    pub redirect_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOptions {
    pub redirect_uri: String,
}

/// How an interactive login ended, as seen by the code that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The user agent left for the provider's login page. Nothing after the
    /// call runs in this page lifetime; the session resumes on the next load.
    Redirected,
    /// The login resolved in place and the provider's token fields are current.
    Completed,
}

/// Client side of an identity provider session.
///
/// One instance lives for the whole process. `token`, `refresh_token` and
/// `authenticated` reflect the outcome of the last `init`/`login`/`logout`.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Sets up the session, returning whether the user is authenticated.
    async fn init(&self, options: InitOptions) -> Result<bool, ProviderError>;
    async fn login(&self, options: LoginOptions) -> Result<LoginOutcome, ProviderError>;
    async fn logout(&self, options: LogoutOptions) -> Result<(), ProviderError>;

    fn token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn authenticated(&self) -> bool;
}

/// Create a provider from a given config.
///
/// `callbacks` must outlive the page load that starts a redirect for the
/// next load to accept its callback.
pub fn create_provider(
    config: &ProviderConfig,
    navigator: Arc<dyn Navigator>,
    callbacks: Arc<dyn CallbackStore>,
) -> Result<Box<dyn Provider>, ProviderError> {
    match config {
        ProviderConfig::Keycloak(cfg) => {
            Ok(Box::new(KeycloakProvider::new(cfg, navigator, callbacks)?))
        }
    }
}
