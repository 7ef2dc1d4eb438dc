use crate::error::{RemoteError, Result};
use crate::protocol::StateEndpoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Deadline applied to state queries unless configured otherwise
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

pub const ENV_BASE_URL: &str = "RECEIVER_BASE_URL";
pub const ENV_QUERY_TIMEOUT_MS: &str = "RECEIVER_QUERY_TIMEOUT_MS";
pub const ENV_COMMAND_TIMEOUT_MS: &str = "RECEIVER_COMMAND_TIMEOUT_MS";
pub const ENV_STATE_ENDPOINT: &str = "RECEIVER_STATE_ENDPOINT";

/// Controller configuration
///
/// # Example
///
/// ```
/// use receiver_remote::{ControllerConfig, StateEndpoint};
/// use std::time::Duration;
///
/// let config = ControllerConfig::new("http://10.205.0.5:8001")
///     .unwrap()
///     .with_query_timeout(Duration::from_millis(750))
///     .with_state_endpoint(StateEndpoint::Device);
/// assert_eq!(config.base_url.port(), Some(8001));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Base URL of the receiver API
    pub base_url: Url,

    /// Deadline for `refresh` and `select_profile`
    #[serde(default = "default_query_timeout", with = "duration_ms")]
    pub query_timeout: Duration,

    /// Deadline for fire-and-forget commands, `None` leaves it to the transport
    #[serde(default, with = "option_duration_ms")]
    pub command_timeout: Option<Duration>,

    /// Endpoint serving the full state snapshot
    #[serde(default)]
    pub state_endpoint: StateEndpoint,
}

fn default_query_timeout() -> Duration {
    DEFAULT_QUERY_TIMEOUT
}

impl ControllerConfig {
    /// Create a configuration for the receiver API at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        Self::from_url(base_url)
    }

    /// Create a configuration from an already parsed URL
    pub fn from_url(base_url: Url) -> Result<Self> {
        let config = Self {
            base_url,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            command_timeout: None,
            state_endpoint: StateEndpoint::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `RECEIVER_*` environment variables
    ///
    /// `RECEIVER_BASE_URL` is required; the others fall back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| RemoteError::InvalidConfig(format!("{} is not set", ENV_BASE_URL)))?;
        let mut config = Self::new(&base_url)?;

        if let Some(ms) = lookup(ENV_QUERY_TIMEOUT_MS) {
            config.query_timeout = parse_millis(ENV_QUERY_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_COMMAND_TIMEOUT_MS) {
            config.command_timeout = Some(parse_millis(ENV_COMMAND_TIMEOUT_MS, &ms)?);
        }
        if let Some(endpoint) = lookup(ENV_STATE_ENDPOINT) {
            config.state_endpoint = endpoint
                .parse()
                .map_err(|e| RemoteError::InvalidConfig(format!("{}: {}", ENV_STATE_ENDPOINT, e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the deadline for state queries
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the deadline for fire-and-forget commands
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set which endpoint serves the full state snapshot
    pub fn with_state_endpoint(mut self, endpoint: StateEndpoint) -> Self {
        self.state_endpoint = endpoint;
        self
    }

    /// Check that the configuration can be used to issue requests
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(RemoteError::InvalidConfig(format!(
                "unsupported scheme '{}'",
                self.base_url.scheme()
            )));
        }
        if self.base_url.cannot_be_a_base() || self.base_url.host().is_none() {
            return Err(RemoteError::InvalidConfig(format!(
                "base URL '{}' has no host",
                self.base_url
            )));
        }
        if self.query_timeout.is_zero() {
            return Err(RemoteError::InvalidConfig("query timeout must be non-zero".to_string()));
        }
        if self.command_timeout.is_some_and(|t| t.is_zero()) {
            return Err(RemoteError::InvalidConfig("command timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| RemoteError::InvalidConfig(format!("{}: '{}' is not a millisecond count", key, value)))
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
