use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::{Origin, Url};

/// Path of the static page the provider returns to after a silent check.
pub const SILENT_CHECK_SSO_PATH: &str = "/silent-check-sso.html";

/// Settings describing the application the session belongs to.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct AppConfig {
    /// Origin the application is served from, e.g. "https://app.example.org".
    pub origin: String,
    /// File holding authorization requests between runs.
    #[serde(default = "default_callback_store")]
    pub callback_store: String,
}

fn default_callback_store() -> String {
    std::env::temp_dir()
        .join("authsession-callbacks.json")
        .to_string_lossy()
        .into_owned()
}

/// Fixed redirect targets handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub silent_check_sso: String,
    pub post_login: String,
    pub post_logout: String,
}

impl AppConfig {
    /// Derives the redirect targets from the configured origin.
    ///
    /// Any path, query or fragment on `origin` is ignored.
    pub fn redirect_targets(&self) -> Result<RedirectTargets, String> {
        let url = Url::parse(&self.origin)
            .map_err(|e| format!("Invalid app origin '{}': {}", self.origin, e))?;

        let origin = match url.origin() {
            Origin::Tuple(..) => url.origin().ascii_serialization(),
            Origin::Opaque(_) => {
                return Err(format!(
                    "App origin '{}' has no usable scheme/host",
                    self.origin
                ))
            }
        };

        Ok(RedirectTargets {
            silent_check_sso: format!("{}{}", origin, SILENT_CHECK_SSO_PATH),
            post_login: format!("{}/", origin),
            post_logout: format!("{}/", origin),
        })
    }
}
