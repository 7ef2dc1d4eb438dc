use thiserror::Error;

/// Result type for receiver remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Errors that can occur while setting up or observing a receiver controller
///
/// Request-time failures are not errors; they are classified into
/// [`Outcome`](crate::Outcome) variants and folded into
/// [`ControllerStatus`](crate::ControllerStatus).
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Base URL could not be parsed
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration value is missing or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Controller was constructed outside a tokio runtime
    #[error("No tokio runtime available")]
    NoRuntime,

    /// Controller was dropped while a subscriber was waiting
    #[error("Controller closed")]
    ConnectionClosed,

    /// Channel receive error
    #[error("Channel error: {0}")]
    ChannelError(String),
}
