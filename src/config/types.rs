use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::app::AppConfig;
use super::logging::LoggingConfig;
use crate::providers::ProviderConfig;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "AUTHSESSION_CONFIG";
/// Prefix for environment overrides, e.g. `AUTHSESSION_PROVIDER__REALM`.
pub const ENV_PREFIX: &str = "AUTHSESSION_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: identity provider, application and logging.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub provider: ProviderConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Builds the figment: the YAML file first, environment variables on top.
pub fn config_figment(path: &str) -> Figment {
    Figment::new().merge(Yaml::file(path)).merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(&["config"])
            .split("__"),
    )
}

/// Extracts a [`ConfigV1`] from any figment, migrating older versions if needed.
pub fn load_config_from(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from `$AUTHSESSION_CONFIG`, or "config.yaml" in the current directory.
pub fn load_config() -> Result<ConfigV1, figment::Error> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(config_figment(&path))
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const TEST_CONFIG: &str = r#"
version: "1.0.0"
provider:
  type: keycloak
  url: http://localhost:8080
  realm: playground
  client_id: frontend
app:
  origin: http://localhost:5173
logging:
  level: debug
  format: json
"#;

    #[test]
    fn test_load_config_from_yaml_string() {
        let config = load_config_from(Figment::new().merge(Yaml::string(TEST_CONFIG))).unwrap();

        let ProviderConfig::Keycloak(keycloak) = &config.provider;
        assert_eq!(keycloak.url, "http://localhost:8080");
        assert_eq!(keycloak.realm, "playground");
        assert_eq!(keycloak.client_id, "frontend");
        assert_eq!(config.app.origin, "http://localhost:5173");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_logging_defaults_when_missing() {
        let yaml = r#"
version: "1.0.0"
provider:
  type: keycloak
  url: http://localhost:8080
  realm: playground
  client_id: frontend
app:
  origin: http://localhost:5173
"#;
        let config = load_config_from(Figment::new().merge(Yaml::string(yaml))).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "console");
        assert_eq!(config.logging.service_name, "authsession");
        assert!(config.app.callback_store.ends_with("authsession-callbacks.json"));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let yaml = TEST_CONFIG.replace("1.0.0", "9.9.9");
        assert!(load_config_from(Figment::new().merge(Yaml::string(&yaml))).is_err());
    }

    #[test]
    fn test_missing_provider_is_rejected() {
        let yaml = r#"
version: "1.0.0"
app:
  origin: http://localhost:5173
"#;
        assert!(load_config_from(Figment::new().merge(Yaml::string(yaml))).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", TEST_CONFIG)?;
            jail.set_env("AUTHSESSION_PROVIDER__REALM", "staging");
            jail.set_env("AUTHSESSION_APP__ORIGIN", "https://app.example.org");

            let config = load_config_from(config_figment("config.yaml"))?;
            let ProviderConfig::Keycloak(keycloak) = &config.provider;
            assert_eq!(keycloak.realm, "staging");
            assert_eq!(keycloak.client_id, "frontend");
            assert_eq!(config.app.origin, "https://app.example.org");
            Ok(())
        });
    }
}
