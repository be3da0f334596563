//! Per-call request configuration.
//!
//! # Design
//! `RequestConfig` mirrors the wrapped client's already-merged configuration:
//! by the time it reaches the adapter, defaults have been applied and the
//! body has been serialized. The adapter reads it and only touches the
//! headers (normalizing them and, for multipart bodies, clearing the content
//! type).
//!
//! Plain-data fields deserialize from JSON with the client's field names
//! (`baseURL`, `responseType`, ...). Callables (`params_serializer`,
//! `validate_status`) and the abort signal are set in code.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::body::RequestBody;
use crate::headers::Headers;
use crate::settle::ValidateStatus;
use crate::url_builder::ParamsSerializer;

/// Query parameters attached to a request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Already-serialized search parameters, appended verbatim.
    Encoded(String),
    Map(Map<String, Value>),
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectPolicy {
    #[default]
    Follow,
    Error,
    Manual,
}

/// Transport passthrough options. The adapter forwards these untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchOptions {
    pub redirect: RedirectPolicy,
    pub max_redirections: Option<usize>,
    /// Milliseconds.
    pub connect_timeout: Option<u64>,
    /// Host-specific options this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FetchOptions {
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }
}

/// Everything the adapter needs to perform one request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestConfig {
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    pub url: Option<String>,
    pub allow_absolute_urls: bool,
    pub params: Option<Params>,
    #[serde(skip)]
    pub params_serializer: Option<ParamsSerializer>,
    /// Defaults to GET when absent.
    pub method: Option<String>,
    #[serde(skip)]
    pub data: Option<RequestBody>,
    /// Milliseconds; `0` disables the timer.
    #[serde(deserialize_with = "deserialize_timeout")]
    pub timeout: u64,
    pub response_type: Option<String>,
    pub headers: Headers,
    pub fetch_options: FetchOptions,
    /// `None` accepts every status.
    #[serde(skip)]
    pub validate_status: Option<ValidateStatus>,
    #[serde(skip)]
    pub signal: Option<CancellationToken>,
}

/// Any JSON number or `null`. Non-positive values disable the timer and
/// fractional milliseconds round up.
fn deserialize_timeout<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = Option::<f64>::deserialize(deserializer)?;
    Ok(match ms {
        Some(ms) if ms > 0.0 => ms.ceil() as u64,
        _ => 0,
    })
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            url: None,
            allow_absolute_urls: true,
            params: None,
            params_serializer: None,
            method: None,
            data: None,
            timeout: 0,
            response_type: None,
            headers: Headers::new(),
            fetch_options: FetchOptions::default(),
            validate_status: Some(ValidateStatus::default()),
            signal: None,
        }
    }
}

impl RequestConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_params(mut self, params: impl Into<Params>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn with_params_serializer(mut self, serializer: ParamsSerializer) -> Self {
        self.params_serializer = Some(serializer);
        self
    }

    pub fn with_data(mut self, data: impl Into<RequestBody>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }

    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value.into());
        self
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    pub fn with_validate_status(mut self, validate: Option<ValidateStatus>) -> Self {
        self.validate_status = validate;
        self
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_match_client_defaults() {
        let config = RequestConfig::default();
        assert!(config.allow_absolute_urls);
        assert_eq!(config.timeout, 0);
        assert!(config.method.is_none());
        let validate = config.validate_status.unwrap();
        assert!(validate.check(204));
        assert!(!validate.check(404));
    }

    #[test]
    fn deserializes_client_field_names() {
        let config: RequestConfig = serde_json::from_value(json!({
            "baseURL": "https://api.example.com",
            "url": "/items",
            "method": "get",
            "params": {"page": 2},
            "timeout": 250,
            "responseType": "json",
            "headers": {"Accept": "application/json"},
            "fetchOptions": {"redirect": "manual", "maxRedirections": 3, "proxy": "socks5://x"}
        }))
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.timeout, 250);
        assert_eq!(config.response_type.as_deref(), Some("json"));
        assert!(matches!(config.params, Some(Params::Map(ref m)) if m["page"] == 2));
        assert!(config.headers.has("accept"));
        assert_eq!(config.fetch_options.redirect, RedirectPolicy::Manual);
        assert_eq!(config.fetch_options.max_redirections, Some(3));
        assert_eq!(config.fetch_options.extra["proxy"], "socks5://x");
        assert!(config.validate_status.is_some());
    }

    #[test]
    fn encoded_params_deserialize_as_string() {
        let config: RequestConfig = serde_json::from_value(json!({"params": "a=1&b=2"})).unwrap();
        assert_eq!(config.params, Some(Params::Encoded("a=1&b=2".to_string())));
    }

    #[test]
    fn builder_sets_fields() {
        let config = RequestConfig::new("/upload")
            .with_base_url("http://localhost")
            .with_method("post")
            .with_timeout(10)
            .with_header("X-Trace", "abc");
        assert_eq!(config.url.as_deref(), Some("/upload"));
        assert_eq!(config.method.as_deref(), Some("post"));
        assert!(config.headers.has("x-trace"));
    }

    #[test]
    fn timeout_accepts_any_json_number() {
        let timeout = |value: Value| {
            serde_json::from_value::<RequestConfig>(json!({"url": "https://e.com/", "timeout": value}))
                .unwrap()
                .timeout
        };
        assert_eq!(timeout(json!(-1)), 0);
        assert_eq!(timeout(json!(0)), 0);
        assert_eq!(timeout(Value::Null), 0);
        assert_eq!(timeout(json!(-0.5)), 0);
        assert_eq!(timeout(json!(1500.0)), 1500);
        assert_eq!(timeout(json!(1500.5)), 1501);
        assert_eq!(timeout(json!(250)), 250);
    }

    #[test]
    fn timeout_rejects_non_numbers() {
        let result = serde_json::from_value::<RequestConfig>(json!({"timeout": "soon"}));
        assert!(result.is_err());
    }
}
