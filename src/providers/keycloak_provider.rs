use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

use super::base::{InitOptions, LoginOptions, LoginOutcome, LogoutOptions, OnLoad, Provider};
use super::callback_store::{CallbackStore, PendingAuthorization};
use super::navigator::{Navigation, Navigator};
use crate::error::ProviderError;
use crate::models::TokenSet;

/// Callback parameters the provider appends to a redirect URI.
const CALLBACK_PARAMS: [&str; 6] = [
    "code",
    "state",
    "session_state",
    "iss",
    "error",
    "error_description",
];

/// Errors a `prompt=none` request answers with when no session exists.
const SILENT_CHECK_MISSES: [&str; 3] = ["login_required", "interaction_required", "consent_required"];

/// Config for a Keycloak realm client.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, PartialEq, Eq)]
pub struct KeycloakProviderConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Base URL of the Keycloak server, e.g. "https://iam.example.org".
    pub url: String,
    pub realm: String,
    pub client_id: String,
}

fn default_name() -> String {
    "keycloak".to_string()
}

/// Parameters parsed out of an authorization callback location.
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// OpenID-Connect authorization-code client for a Keycloak realm.
pub struct KeycloakProvider {
    config: KeycloakProviderConfig,
    /// ".../realms/<realm>/protocol/openid-connect"
    endpoint_base: String,
    client: reqwest::Client,
    navigator: Arc<dyn Navigator>,
    callbacks: Arc<dyn CallbackStore>,
    tokens: RwLock<Option<TokenSet>>,
}

impl KeycloakProvider {
    pub fn new(
        config: &KeycloakProviderConfig,
        navigator: Arc<dyn Navigator>,
        callbacks: Arc<dyn CallbackStore>,
    ) -> Result<Self, ProviderError> {
        info!(
            "Creating KeycloakProvider for realm '{}', name='{}'",
            config.realm, config.name
        );

        let endpoint_base = format!(
            "{}/realms/{}/protocol/openid-connect",
            config.url.trim_end_matches('/'),
            config.realm
        );
        Url::parse(&endpoint_base).map_err(|e| {
            ProviderError::Config(format!("Invalid Keycloak url '{}': {}", config.url, e))
        })?;

        Ok(Self {
            config: config.clone(),
            endpoint_base,
            client: reqwest::Client::new(),
            navigator,
            callbacks,
            tokens: RwLock::new(None),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.endpoint_base, name)
    }

    fn read_tokens(&self) -> RwLockReadGuard<'_, Option<TokenSet>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tokens(&self) -> RwLockWriteGuard<'_, Option<TokenSet>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds an authorization request URL and saves the request so its
    /// callback can be recognised. Returns the URL and the request's `state`.
    fn authorization_url(
        &self,
        redirect_uri: &str,
        prompt: Option<&str>,
    ) -> Result<(Url, String), ProviderError> {
        let pending = PendingAuthorization::generate(redirect_uri);
        let challenge = pending.code_challenge();

        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("state", pending.state.as_str()),
            ("response_mode", "fragment"),
            ("response_type", "code"),
            ("scope", "openid"),
            ("code_challenge", challenge.as_str()),
            ("code_challenge_method", "S256"),
        ];
        if let Some(prompt) = prompt {
            params.push(("prompt", prompt));
        }

        let url = Url::parse_with_params(&self.endpoint("auth"), &params)
            .map_err(|e| ProviderError::Config(format!("Failed to build authorization url: {}", e)))?;

        let state = pending.state.clone();
        self.callbacks.add(pending)?;
        Ok((url, state))
    }

    /// Forgets a request that will never be answered.
    fn discard(&self, state: &str) {
        if let Err(e) = self.callbacks.take(state) {
            warn!("Failed to discard authorization request: {}", e);
        }
    }

    /// The saved request a callback answers, if this client issued it.
    fn claim(&self, params: &CallbackParams) -> Result<Option<PendingAuthorization>, ProviderError> {
        match params.state.as_deref() {
            Some(state) => self.callbacks.take(state),
            None => Ok(None),
        }
    }

    /// The current location with any callback parameters removed.
    fn current_location(&self) -> Result<String, ProviderError> {
        let current = self.navigator.current_url().ok_or_else(|| {
            ProviderError::navigation("No current location to return to after authorization")
        })?;
        Ok(parse_callback(&current)
            .map(|(_, location)| location)
            .unwrap_or_else(|| current.to_string()))
    }

    /// Handles the location a request issued with `state` came back to.
    async fn answer(&self, location: &Url, state: &str) -> Result<bool, ProviderError> {
        let Some((params, _)) = parse_callback(location) else {
            self.discard(state);
            return Err(ProviderError::callback(
                "navigation returned without an authorization response",
            ));
        };
        match self.claim(&params)? {
            Some(pending) => self.process_callback(params, pending).await,
            None => {
                self.discard(state);
                warn!("Authorization callback state does not match the pending request");
                Err(ProviderError::callback("state mismatch"))
            }
        }
    }

    /// Handles a callback answering `pending` and, for an authorization code,
    /// exchanges it for tokens. Returns whether the user is now authenticated.
    async fn process_callback(
        &self,
        params: CallbackParams,
        pending: PendingAuthorization,
    ) -> Result<bool, ProviderError> {
        if let Some(error) = params.error {
            if SILENT_CHECK_MISSES.contains(&error.as_str()) {
                debug!(error = error.as_str(), "no provider session found");
                return Ok(false);
            }
            let description = params.error_description.unwrap_or_default();
            warn!(error = error.as_str(), "provider rejected the authorization request");
            return Err(ProviderError::callback(format!("{}: {}", error, description)));
        }

        let code = params
            .code
            .ok_or_else(|| ProviderError::callback("missing authorization code"))?;

        let tokens = self.exchange_code(&code, &pending).await?;
        *self.write_tokens() = Some(tokens);
        info!(realm = self.config.realm.as_str(), "authorization code exchanged");
        Ok(true)
    }

    async fn exchange_code(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<TokenSet, ProviderError> {
        debug!(
            "Exchanging authorization code at realm='{}'",
            self.config.realm
        );

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", pending.redirect_uri.as_str()),
            ("code_verifier", pending.code_verifier.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint("token"))
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::request(format!("Failed to call token endpoint: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::protocol(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        response
            .json::<TokenSet>()
            .await
            .map_err(|e| ProviderError::protocol(format!("Failed to parse token response: {}", e)))
    }

    /// Hands the user agent to `url`. `None` means the page left; `Some`
    /// carries the authentication result when the host came back in place.
    async fn follow(&self, url: Url, state: &str) -> Result<Option<bool>, ProviderError> {
        let navigation = match self.navigator.redirect(url).await {
            Ok(navigation) => navigation,
            Err(e) => {
                self.discard(state);
                return Err(e);
            }
        };
        match navigation {
            Navigation::Left => Ok(None),
            Navigation::Returned(location) => self.answer(&location, state).await.map(Some),
        }
    }

    async fn check_sso(&self, silent_redirect_uri: Option<String>) -> Result<bool, ProviderError> {
        let Some(silent_redirect_uri) = silent_redirect_uri else {
            let location = self.current_location()?;
            let (url, state) = self.authorization_url(&location, Some("none"))?;
            return Ok(self.follow(url, &state).await?.unwrap_or(false));
        };

        let (url, state) = self.authorization_url(&silent_redirect_uri, Some("none"))?;
        let result = match self.navigator.silent_check(url).await {
            Ok(result) => result,
            Err(e) => {
                self.discard(&state);
                return Err(e);
            }
        };
        match result {
            Some(location) => self.answer(&location, &state).await,
            None => {
                debug!("silent check unavailable; reporting no session");
                self.discard(&state);
                Ok(false)
            }
        }
    }
}

/// Splits a location into its callback parameters (fragment first, then
/// query) and the location without them. `None` if it is not a callback.
fn parse_callback(location: &Url) -> Option<(CallbackParams, String)> {
    fn collect(pairs: form_urlencoded::Parse<'_>) -> CallbackParams {
        let mut params = CallbackParams::default();
        for (key, value) in pairs {
            let value = Some(value.into_owned());
            match &*key {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        params
    }

    let is_callback = |p: &CallbackParams| p.code.is_some() || p.error.is_some();

    if let Some(fragment) = location.fragment() {
        let params = collect(form_urlencoded::parse(fragment.as_bytes()));
        if is_callback(&params) {
            let mut stripped = location.clone();
            stripped.set_fragment(None);
            return Some((params, stripped.to_string()));
        }
    }

    let params = collect(location.query_pairs());
    if !is_callback(&params) {
        return None;
    }

    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&&**key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut stripped = location.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    Some((params, stripped.to_string()))
}

#[async_trait::async_trait]
impl Provider for KeycloakProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn init(&self, options: InitOptions) -> Result<bool, ProviderError> {
        if options.check_login_iframe {
            warn!("Session status iframe is not supported here; ignoring check_login_iframe");
        }

        if let Some((params, _)) = self.navigator.current_url().as_ref().and_then(parse_callback) {
            match self.claim(&params)? {
                Some(pending) => {
                    debug!("Processing authorization callback from the current location");
                    return self.process_callback(params, pending).await;
                }
                None => warn!("Ignoring authorization callback with an unknown state"),
            }
        }

        match options.on_load {
            Some(OnLoad::CheckSso) => self.check_sso(options.silent_check_sso_redirect_uri).await,
            Some(OnLoad::LoginRequired) => {
                let redirect_uri = self.current_location()?;
                let outcome = self.login(LoginOptions { redirect_uri }).await?;
                Ok(outcome == LoginOutcome::Completed && self.authenticated())
            }
            None => Ok(self.authenticated()),
        }
    }

    async fn login(&self, options: LoginOptions) -> Result<LoginOutcome, ProviderError> {
        let (url, state) = self.authorization_url(&options.redirect_uri, None)?;
        info!(realm = self.config.realm.as_str(), "starting interactive login");
        match self.follow(url, &state).await? {
            None => Ok(LoginOutcome::Redirected),
            Some(_) => Ok(LoginOutcome::Completed),
        }
    }

    async fn logout(&self, options: LogoutOptions) -> Result<(), ProviderError> {
        let id_token = self
            .read_tokens()
            .as_ref()
            .and_then(|t| t.id_token.clone());

        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("post_logout_redirect_uri", options.redirect_uri.as_str()),
        ];
        if let Some(id_token) = id_token.as_deref() {
            params.push(("id_token_hint", id_token));
        }
        let url = Url::parse_with_params(&self.endpoint("logout"), &params)
            .map_err(|e| ProviderError::Config(format!("Failed to build logout url: {}", e)))?;

        info!(realm = self.config.realm.as_str(), "logging out");
        self.navigator.redirect(url).await?;
        *self.write_tokens() = None;
        Ok(())
    }

    fn token(&self) -> Option<String> {
        self.read_tokens()
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.read_tokens()
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }

    fn authenticated(&self) -> bool {
        self.read_tokens().is_some()
    }
}
