use crate::core::types::duration_millis;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::time::Duration;

pub const DEFAULT_REST_URL: &str = "https://api.binance.com";
pub const DEFAULT_STREAM_URL: &str = "wss://stream.binance.com:9443";
pub const TESTNET_REST_URL: &str = "https://testnet.binance.vision";
pub const TESTNET_STREAM_URL: &str = "wss://testnet.binance.vision";
pub const DEFAULT_USER_AGENT: &str = "LotusX/1.0";
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub testnet: bool,
    pub base_url: Option<String>,
    pub stream_url: Option<String>,
    pub user_agent: String,
    pub recv_window_ms: u64,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 7)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("stream_url", &self.stream_url)?;
        state.serialize_field("user_agent", &self.user_agent)?;
        state.serialize_field("recv_window_ms", &self.recv_window_ms)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            testnet: bool,
            #[serde(default)]
            base_url: Option<String>,
            #[serde(default)]
            stream_url: Option<String>,
            #[serde(default = "default_user_agent")]
            user_agent: String,
            #[serde(default = "default_recv_window_ms")]
            recv_window_ms: u64,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            testnet: helper.testnet,
            base_url: helper.base_url,
            stream_url: helper.stream_url,
            user_agent: helper.user_agent,
            recv_window_ms: helper.recv_window_ms,
        })
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_recv_window_ms() -> u64 {
    DEFAULT_RECV_WINDOW_MS
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet: false,
            base_url: None,
            stream_url: None,
            user_agent: default_user_agent(),
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `BINANCE_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY` (e.g., `BINANCE_SECRET_KEY`)
    /// - `{PREFIX}_TESTNET` (optional, defaults to false)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_STREAM_URL` (optional)
    /// - `{PREFIX}_RECV_WINDOW_MS` (optional, defaults to 5000)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let testnet = env::var(format!("{}_TESTNET", prefix))
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let recv_window_var = format!("{}_RECV_WINDOW_MS", prefix);
        let recv_window_ms = match env::var(&recv_window_var) {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!("{}: {}", recv_window_var, e))
            })?,
            Err(_) => DEFAULT_RECV_WINDOW_MS,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet,
            base_url: env::var(format!("{}_BASE_URL", prefix)).ok(),
            stream_url: env::var(format!("{}_STREAM_URL", prefix)).ok(),
            user_agent: default_user_agent(),
            recv_window_ms,
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Configuration for public endpoints and market streams only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn stream_url(mut self, stream_url: String) -> Self {
        self.stream_url = Some(stream_url);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn recv_window(mut self, recv_window: Duration) -> Self {
        self.recv_window_ms = duration_millis(recv_window);
        self
    }

    /// REST base URL, honouring testnet and explicit overrides in that order
    pub fn rest_url(&self) -> &str {
        if self.testnet {
            TESTNET_REST_URL
        } else {
            self.base_url.as_deref().unwrap_or(DEFAULT_REST_URL)
        }
    }

    pub fn websocket_url(&self) -> &str {
        if self.testnet {
            TESTNET_STREAM_URL
        } else {
            self.stream_url.as_deref().unwrap_or(DEFAULT_STREAM_URL)
        }
    }

    pub const fn default_recv_window(&self) -> Duration {
        Duration::from_millis(self.recv_window_ms)
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
