use crate::error::Result;
use crate::protocol::ActionRequest;
use crate::types::DeviceState;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use url::Url;

/// Classified result of a single receiver API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 200 with a body that decoded into a state snapshot
    Decoded(DeviceState),

    /// 200, no body expected
    Succeeded,

    /// Deadline exceeded before the exchange completed
    TimedOut,

    /// Connection-level failure (refused, DNS, reset, ...)
    TransportError(String),

    /// Any status other than 200
    HttpError(u16),

    /// 200 but the body did not match the state shape
    DecodeError,
}

impl Outcome {
    /// Check whether the receiver accepted the request
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Decoded(_) | Outcome::Succeeded)
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Decoded(_) => "decoded",
            Outcome::Succeeded => "succeeded",
            Outcome::TimedOut => "timed_out",
            Outcome::TransportError(_) => "transport_error",
            Outcome::HttpError(_) => "http_error",
            Outcome::DecodeError => "decode_error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Decoded(state) => write!(f, "decoded state (profile {})", state.profile),
            Outcome::Succeeded => f.write_str("succeeded"),
            Outcome::TimedOut => f.write_str("timed out"),
            Outcome::TransportError(msg) => write!(f, "transport error: {}", msg),
            Outcome::HttpError(code) => write!(f, "HTTP status {}", code),
            Outcome::DecodeError => f.write_str("undecodable response body"),
        }
    }
}

/// Issues receiver API requests and classifies their outcome
///
/// Holds no state beyond the base URL and the pooled HTTP client; every call
/// to [`perform`](Self::perform) sends exactly one request and never retries.
#[derive(Debug, Clone)]
pub struct HttpActionClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpActionClient {
    /// Create a client for the receiver API at `base_url`
    ///
    /// Redirects are not followed, so a 3xx reply surfaces as `HttpError`.
    pub fn new(base_url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing `reqwest::Client`
    ///
    /// The caller's client keeps its own redirect policy.
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send the request and classify the result
    ///
    /// When the request carries a timeout it bounds the whole exchange,
    /// including reading the body.
    pub async fn perform(&self, request: &ActionRequest) -> Outcome {
        let outcome = match self.send(request).await {
            Ok(None) => Outcome::Succeeded,
            Ok(Some(body)) => match decode::<DeviceState>(request, &body) {
                Some(state) => Outcome::Decoded(state),
                None => Outcome::DecodeError,
            },
            Err(failure) => failure,
        };

        tracing::debug!(
            id = %request.id,
            endpoint = %request.endpoint,
            outcome = outcome.label(),
            "Receiver request finished"
        );

        outcome
    }

    /// Send the request and decode a JSON body of any shape
    ///
    /// Used for auxiliary queries such as power state. The body is always read,
    /// whatever `expect_body` says. Failures come back as the `Outcome` that
    /// [`perform`](Self::perform) would have produced.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ActionRequest) -> std::result::Result<T, Outcome> {
        let mut request = request.clone();
        request.expect_body = true;

        let body = self.send(&request).await?.unwrap_or_default();
        let result = decode::<T>(&request, &body).ok_or(Outcome::DecodeError);

        tracing::debug!(
            id = %request.id,
            endpoint = %request.endpoint,
            ok = result.is_ok(),
            "Receiver fetch finished"
        );

        result
    }

    /// Issue the request; `Ok(Some(body))` only when a body was expected
    async fn send(&self, request: &ActionRequest) -> std::result::Result<Option<Vec<u8>>, Outcome> {
        let Some(url) = request.endpoint.url(&self.base_url) else {
            return Err(Outcome::TransportError(format!(
                "cannot resolve {} against {}",
                request.endpoint, self.base_url
            )));
        };

        tracing::debug!(
            id = %request.id,
            method = %request.method,
            endpoint = %request.endpoint,
            query = ?request.query,
            "Sending receiver request"
        );

        let mut builder = self.client.request(request.method.into(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let exchange = Self::exchange(builder, request.expect_body);
        let result = match request.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, exchange).await {
                Ok(result) => result,
                Err(_) => return Err(Outcome::TimedOut),
            },
            None => exchange.await,
        };

        match result {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(code)) => Err(Outcome::HttpError(code)),
            Err(e) if e.is_timeout() => Err(Outcome::TimedOut),
            Err(e) => Err(Outcome::TransportError(e.to_string())),
        }
    }

    async fn exchange(
        builder: reqwest::RequestBuilder,
        expect_body: bool,
    ) -> reqwest::Result<std::result::Result<Option<Vec<u8>>, u16>> {
        let response = builder.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(Err(status.as_u16()));
        }

        if !expect_body {
            return Ok(Ok(None));
        }

        Ok(Ok(Some(response.bytes().await?.to_vec())))
    }
}

fn decode<T: DeserializeOwned>(request: &ActionRequest, body: &[u8]) -> Option<T> {
    match serde_json::from_slice::<T>(body) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                id = %request.id,
                endpoint = %request.endpoint,
                "Failed to decode receiver response: {}",
                e
            );
            None
        }
    }
}
