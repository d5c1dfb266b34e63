use std::sync::Arc;

use authsession::config::{load_config_from, ConfigV1};
use authsession::providers::{
    CallbackStore, FileCallbackStore, MemoryCallbackStore, PendingAuthorization,
};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use mockito::{Mock, Server};

pub const REALM: &str = "playground";
pub const ORIGIN: &str = "http://localhost:5173";
/// State of the login request the tests' callbacks answer.
pub const CALLBACK_STATE: &str = "from-provider";
pub const CODE_VERIFIER: &str = "integration-code-verifier";

pub const TOKEN_RESPONSE: &str = r#"{
    "access_token": "fake-token",
    "refresh_token": "fake-refresh-token",
    "id_token": "fake-id-token",
    "expires_in": 300,
    "token_type": "Bearer",
    "scope": "openid profile"
}"#;

/// Config pointing the Keycloak provider at `provider_url`, with a callback
/// store file of its own.
pub fn test_config(provider_url: &str) -> ConfigV1 {
    let callback_store = std::env::temp_dir()
        .join(format!("authsession-it-{}.json", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    let yaml = format!(
        r#"
version: "1.0.0"
provider:
  type: keycloak
  name: test-keycloak
  url: {provider_url}
  realm: {REALM}
  client_id: frontend
app:
  origin: {ORIGIN}
  callback_store: {callback_store}
logging:
  level: debug
  format: console
"#
    );

    load_config_from(Figment::new().merge(Yaml::string(&yaml)))
        .expect("Failed to parse test config YAML")
}

pub fn token_path() -> String {
    format!("/realms/{}/protocol/openid-connect/token", REALM)
}

/// Mocks a token endpoint that answers every code exchange with `status`.
pub async fn mock_token_endpoint(server: &mut Server, status: usize, body: &str) -> Mock {
    server
        .mock("POST", token_path().as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

/// The login request an earlier page load sent to the provider.
pub fn sent_earlier() -> PendingAuthorization {
    PendingAuthorization {
        state: CALLBACK_STATE.to_string(),
        code_verifier: CODE_VERIFIER.to_string(),
        ..PendingAuthorization::generate(&format!("{}/", ORIGIN))
    }
}

/// In-memory callback store holding [`sent_earlier`].
pub fn memory_callbacks() -> Arc<MemoryCallbackStore> {
    let callbacks = Arc::new(MemoryCallbackStore::new());
    callbacks.add(sent_earlier()).expect("seed callback store");
    callbacks
}

/// Writes [`sent_earlier`] to the config's callback store file.
pub fn seed_callback_file(config: &ConfigV1) {
    FileCallbackStore::new(&config.app.callback_store)
        .add(sent_earlier())
        .expect("seed callback store file");
}

/// The app location a provider redirects back to after a successful login.
pub fn callback_url(code: &str) -> url::Url {
    url::Url::parse(&format!(
        "{}/#state={}&session_state=x&code={}",
        ORIGIN, CALLBACK_STATE, code
    ))
    .expect("valid callback url")
}
