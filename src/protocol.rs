use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Receiver API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Device,
    Profile,
    Volume,
    VolumeUp,
    VolumeDown,
    Subwoofer,
    SubwooferUp,
    SubwooferDown,
    Power,
    PowerOn,
    PowerOff,
    PowerSwitch,
}

impl Endpoint {
    /// Path of the endpoint relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Device => "/device",
            Endpoint::Profile => "/profile",
            Endpoint::Volume => "/volume",
            Endpoint::VolumeUp => "/volume/up",
            Endpoint::VolumeDown => "/volume/down",
            Endpoint::Subwoofer => "/subwoofer",
            Endpoint::SubwooferUp => "/subwoofer/up",
            Endpoint::SubwooferDown => "/subwoofer/down",
            Endpoint::Power => "/power",
            Endpoint::PowerOn => "/power/on",
            Endpoint::PowerOff => "/power/off",
            Endpoint::PowerSwitch => "/power/switch",
        }
    }

    /// Resolve this endpoint against a base URL, keeping any base path prefix
    ///
    /// Returns `None` for URLs that cannot carry a path (e.g. `mailto:`).
    pub fn url(&self, base: &Url) -> Option<Url> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments.pop_if_empty();
            segments.extend(self.path().trim_start_matches('/').split('/'));
        }
        Some(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Endpoint serving the full state snapshot on `GET`
///
/// Older receiver API builds serve it on `/device`, current ones on `/profile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateEndpoint {
    #[default]
    Profile,
    Device,
}

impl StateEndpoint {
    /// Get the API endpoint to query
    pub fn endpoint(&self) -> Endpoint {
        match self {
            StateEndpoint::Profile => Endpoint::Profile,
            StateEndpoint::Device => Endpoint::Device,
        }
    }
}

impl std::str::FromStr for StateEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" | "/profile" => Ok(StateEndpoint::Profile),
            "device" | "/device" => Ok(StateEndpoint::Device),
            other => Err(format!("unknown state endpoint '{}'", other)),
        }
    }
}

/// HTTP methods used by the receiver API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

impl HttpMethod {
    /// Get the method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against the receiver API
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub id: Uuid,
    pub endpoint: Endpoint,
    pub method: HttpMethod,
    pub query: BTreeMap<String, String>,
    pub expect_body: bool,
    pub timeout: Option<Duration>,
}

impl ActionRequest {
    /// Create a new request with the given endpoint and method
    pub fn new(endpoint: Endpoint, method: HttpMethod) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint,
            method,
            query: BTreeMap::new(),
            expect_body: false,
            timeout: None,
        }
    }

    /// Add a query parameter (percent-encoded when sent)
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    /// Expect a `DeviceState` body in the response
    pub fn expecting_body(mut self) -> Self {
        self.expect_body = true;
        self
    }

    /// Set an explicit deadline
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the request ID
    pub fn id(&self) -> Uuid {
        self.id
    }
}
