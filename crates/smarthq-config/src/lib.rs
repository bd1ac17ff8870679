//! Configuration for the SmartHQ bridge.
//!
//! Serialized defaults, an optional TOML file, then `SMARTHQ_*`
//! environment variables, merged with figment and translated into a
//! `smarthq_core::ClientConfig`, the facade bind address, and the
//! authenticator the client should use.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use futures_util::future::BoxFuture;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use smarthq_api::wire::PubsubTopics;
use smarthq_api::{Authenticator, StaticTokenAuthenticator};
use smarthq_core::config::{DEFAULT_API_HOST, DEFAULT_WEBSOCKET_URL};
use smarthq_core::{ClientConfig, ReconnectPolicy};

/// Prefix for environment overrides, e.g. `SMARTHQ_PORT=9000`.
pub const ENV_PREFIX: &str = "SMARTHQ_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured: set access_token (SMARTHQ_ACCESS_TOKEN)")]
    NoCredentials,

    #[error("config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config ──────────────────────────────────────────────────────────

/// Flat settings table. Every key can be set in the TOML file or as
/// `SMARTHQ_<KEY>` in the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Bearer token handed to the event stream (plaintext; prefer the env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Account login. Password login is not supported; see [`Config::authenticator`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Informational only.
    pub region: String,

    pub websocket_url: String,
    pub api_host: String,

    pub enable_alerts: bool,
    pub enable_services: bool,
    pub enable_presence: bool,
    pub enable_commands: bool,

    /// Initial reconnect delay, seconds.
    pub reconnect_interval: u64,
    /// Reconnect delay cap, seconds.
    pub reconnect_max_interval: u64,
    /// Ping period, seconds. `0` disables the heartbeat.
    pub heartbeat_interval: u64,

    pub log_level: String,

    pub host: String,
    pub port: u16,

    /// Domain events retained for `GET /events`.
    pub event_log_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            username: None,
            password: None,
            region: "US".into(),
            websocket_url: DEFAULT_WEBSOCKET_URL.into(),
            api_host: DEFAULT_API_HOST.into(),
            enable_alerts: true,
            enable_services: true,
            enable_presence: true,
            enable_commands: true,
            reconnect_interval: 5,
            reconnect_max_interval: 300,
            heartbeat_interval: 60,
            log_level: "info".into(),
            host: "0.0.0.0".into(),
            port: 8080,
            event_log_capacity: 100,
        }
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// The provider chain: defaults, then `path` if given, then environment.
pub fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX))
}

/// Load and validate the configuration.
///
/// An explicitly named file must exist; without one, only defaults and
/// the environment are consulted.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
    }
    let config: Config = figment(path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Check everything that can be checked without a network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;
        self.bind_addr()?;
        if self.api_host.trim().is_empty() {
            return Err(invalid("api_host", "must not be empty"));
        }
        if self.reconnect_interval == 0 {
            return Err(invalid("reconnect_interval", "must be at least 1 second"));
        }
        if self.reconnect_max_interval < self.reconnect_interval {
            return Err(invalid(
                "reconnect_max_interval",
                format!(
                    "{}s is shorter than reconnect_interval ({}s)",
                    self.reconnect_max_interval, self.reconnect_interval
                ),
            ));
        }
        if self.event_log_capacity == 0 {
            return Err(invalid("event_log_capacity", "must be at least 1"));
        }
        Ok(())
    }

    fn endpoint(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.websocket_url)
            .map_err(|e| invalid("websocket_url", e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(invalid(
                "websocket_url",
                format!("unsupported scheme '{other}', expected ws or wss"),
            )),
        }
    }

    pub fn topics(&self) -> PubsubTopics {
        PubsubTopics {
            alerts: self.enable_alerts,
            services: self.enable_services,
            presence: self.enable_presence,
            commands: self.enable_commands,
        }
    }

    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::new(self.endpoint()?);
        config.api_host.clone_from(&self.api_host);
        config.topics = self.topics();
        config.heartbeat_interval = Duration::from_secs(self.heartbeat_interval);
        config.reconnect = ReconnectPolicy {
            initial_delay: Duration::from_secs(self.reconnect_interval),
            max_delay: Duration::from_secs(self.reconnect_max_interval),
        };
        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| invalid("host", format!("'{}' is not an IP address", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Resolve the authenticator for the configured credentials.
    ///
    /// A token wins. Username/password alone yields an authenticator
    /// that always fails, so the problem surfaces as an authentication
    /// error at connect time.
    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>, ConfigError> {
        if let Some(token) = &self.access_token {
            return Ok(Arc::new(StaticTokenAuthenticator::new(SecretString::from(
                token.clone(),
            ))));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(_)) => Ok(Arc::new(PasswordLoginUnsupported {
                username: username.clone(),
            })),
            _ => Err(ConfigError::NoCredentials),
        }
    }
}

struct PasswordLoginUnsupported {
    username: String,
}

impl Authenticator for PasswordLoginUnsupported {
    fn authenticate(&self) -> BoxFuture<'_, Result<SecretString, smarthq_api::Error>> {
        Box::pin(async move {
            Err(smarthq_api::Error::Authentication {
                message: format!(
                    "password login for '{}' is not supported; set access_token instead",
                    self.username
                ),
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|_| {
            let config: Config = figment(None).extract()?;
            assert_eq!(config.port, 8080);
            assert_eq!(config.websocket_url, DEFAULT_WEBSOCKET_URL);
            assert!(config.access_token.is_none());

            let client = config.client_config().unwrap();
            assert_eq!(client.reconnect, ReconnectPolicy::default());
            assert_eq!(client.heartbeat_interval, Duration::from_secs(60));
            assert_eq!(client.topics, PubsubTopics::default());
            Ok(())
        });
    }

    #[test]
    fn file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "smarthq.toml",
                r#"
                    access_token = "from-file"
                    port = 9000
                    enable_presence = false
                    reconnect_interval = 10
                "#,
            )?;
            jail.set_env("SMARTHQ_PORT", "9100");
            jail.set_env("SMARTHQ_ACCESS_TOKEN", "from-env");

            let config = load(Some(Path::new("smarthq.toml"))).unwrap();
            assert_eq!(config.port, 9100);
            assert!(!config.enable_presence);
            assert_eq!(config.access_token.as_deref(), Some("from-env"));

            let client = config.client_config().unwrap();
            assert!(!client.topics.presence);
            assert_eq!(client.reconnect.initial_delay, Duration::from_secs(10));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        Jail::expect_with(|_| {
            let err = load(Some(Path::new("nope.toml"))).unwrap_err();
            assert!(matches!(err, ConfigError::MissingFile { .. }));
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad_scheme = Config {
            websocket_url: "https://example.com".into(),
            ..Config::default()
        };
        assert!(matches!(
            bad_scheme.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "websocket_url"
        ));

        let inverted = Config {
            reconnect_interval: 60,
            reconnect_max_interval: 30,
            ..Config::default()
        };
        assert!(inverted.validate().is_err());

        let bad_host = Config {
            host: "localhost:80".into(),
            ..Config::default()
        };
        assert!(bad_host.bind_addr().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn credentials_resolution() {
        assert!(matches!(
            Config::default().authenticator(),
            Err(ConfigError::NoCredentials)
        ));

        let token = Config {
            access_token: Some("t".into()),
            ..Config::default()
        };
        assert!(token.authenticator().is_ok());
    }

    #[tokio::test]
    async fn password_only_fails_at_authentication() {
        let config = Config {
            username: Some("me@example.com".into()),
            password: Some("hunter2".into()),
            ..Config::default()
        };
        let auth = config.authenticator().unwrap();
        let err = auth.authenticate().await.unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn bind_address_combines_host_and_port() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 8123,
            ..Config::default()
        };
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8123");
    }
}
