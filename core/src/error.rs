//! Error types for the fetch adapter.
//!
//! # Design
//! `AdapterError` is the only error that crosses the adapter boundary. It is
//! classified by an optional `ErrorCode` and always carries the configuration
//! that produced it; the native request is attached once it exists, and the
//! response is attached when `settle` rejects on status.
//!
//! `TransportError` is what a host transport reports. Its free-form `code`
//! survives wrapping so callers can tell a refused connection from a DNS
//! failure without the adapter knowing about either.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::RequestConfig;
use crate::http::NativeRequest;
use crate::response::AdapterResponse;

/// Boxed error used for wrapped causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Classification codes shared with the wrapped HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BadOptionValue,
    BadOption,
    /// The request was aborted, including by the adapter's own timeout.
    ConnAborted,
    TimedOut,
    Network,
    TooManyRedirects,
    Deprecated,
    /// 5xx status rejected by `settle`.
    BadResponse,
    /// 4xx status rejected by `settle`.
    BadRequest,
    Canceled,
    NotSupport,
    InvalidUrl,
    /// A host-defined code the adapter passes through untouched.
    Other(String),
}

impl ErrorCode {
    /// Parse a wire token, keeping unknown tokens as `Other`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "ERR_BAD_OPTION_VALUE" => Self::BadOptionValue,
            "ERR_BAD_OPTION" => Self::BadOption,
            "ECONNABORTED" => Self::ConnAborted,
            "ETIMEDOUT" => Self::TimedOut,
            "ERR_NETWORK" => Self::Network,
            "ERR_FR_TOO_MANY_REDIRECTS" => Self::TooManyRedirects,
            "ERR_DEPRECATED" => Self::Deprecated,
            "ERR_BAD_RESPONSE" => Self::BadResponse,
            "ERR_BAD_REQUEST" => Self::BadRequest,
            "ERR_CANCELED" => Self::Canceled,
            "ERR_NOT_SUPPORT" => Self::NotSupport,
            "ERR_INVALID_URL" => Self::InvalidUrl,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::BadOptionValue => "ERR_BAD_OPTION_VALUE",
            Self::BadOption => "ERR_BAD_OPTION",
            Self::ConnAborted => "ECONNABORTED",
            Self::TimedOut => "ETIMEDOUT",
            Self::Network => "ERR_NETWORK",
            Self::TooManyRedirects => "ERR_FR_TOO_MANY_REDIRECTS",
            Self::Deprecated => "ERR_DEPRECATED",
            Self::BadResponse => "ERR_BAD_RESPONSE",
            Self::BadRequest => "ERR_BAD_REQUEST",
            Self::Canceled => "ERR_CANCELED",
            Self::NotSupport => "ERR_NOT_SUPPORT",
            Self::InvalidUrl => "ERR_INVALID_URL",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The standardized error returned by `FetchAdapter::request`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
    code: Option<ErrorCode>,
    config: Arc<RequestConfig>,
    request: Option<Arc<NativeRequest>>,
    response: Option<Box<AdapterResponse>>,
    #[source]
    source: Option<BoxError>,
    /// Set only by `timeout`; a transport's own `ECONNABORTED` leaves it clear.
    timed_out: bool,
}

impl AdapterError {
    /// Direct construction from a message and code.
    pub fn new(
        message: impl Into<String>,
        code: Option<ErrorCode>,
        config: Arc<RequestConfig>,
        request: Option<Arc<NativeRequest>>,
    ) -> Self {
        Self {
            message: message.into(),
            code,
            config,
            request,
            response: None,
            source: None,
            timed_out: false,
        }
    }

    /// Wrap a lower-level error, keeping its message and recording it as the
    /// source.
    pub fn from_source<E>(
        err: E,
        code: Option<ErrorCode>,
        config: Arc<RequestConfig>,
        request: Option<Arc<NativeRequest>>,
    ) -> Self
    where
        E: Into<BoxError>,
    {
        let source = err.into();
        Self {
            message: source.to_string(),
            code,
            config,
            request,
            response: None,
            source: Some(source),
            timed_out: false,
        }
    }

    /// The error raised when the adapter's timer wins the race.
    pub fn timeout(
        timeout_ms: u64,
        config: Arc<RequestConfig>,
        request: Option<Arc<NativeRequest>>,
    ) -> Self {
        Self {
            timed_out: true,
            ..Self::new(
                format!("timeout of {timeout_ms}ms exceeded"),
                Some(ErrorCode::ConnAborted),
                config,
                request,
            )
        }
    }

    /// The error raised when the caller's abort signal fires.
    pub fn canceled(config: Arc<RequestConfig>, request: Option<Arc<NativeRequest>>) -> Self {
        Self::new("canceled", Some(ErrorCode::Canceled), config, request)
    }

    /// Attach the response that failed validation. `settle` uses this, and
    /// hosts running their own status checks can do the same.
    pub fn with_response(mut self, response: AdapterResponse) -> Self {
        self.response = Some(Box::new(response));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn request(&self) -> Option<&NativeRequest> {
        self.request.as_deref()
    }

    /// The response that failed status validation, if that is why this error
    /// exists.
    pub fn response(&self) -> Option<&AdapterResponse> {
        self.response.as_deref()
    }

    /// `true` only when the adapter's own timer fired.
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }

    pub fn is_canceled(&self) -> bool {
        self.code == Some(ErrorCode::Canceled)
    }
}

/// Failure reported by a host transport.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    code: Option<String>,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}
