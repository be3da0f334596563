//! The fetch adapter: request configuration in, settled response out.
//!
//! # Design
//! `FetchAdapter::request` runs the whole pipeline for one call:
//! 1. resolve the URL (base + path + serialized params),
//! 2. resolve the response type before any body is read,
//! 3. clear the content type for multipart bodies and normalize headers,
//! 4. build the `NativeRequest` and hand it to the host `Fetch`,
//! 5. decode the body and pass the response to `settle`.
//!
//! Transport and decode failures are wrapped into `AdapterError` with the
//! transport's code preserved; `settle`'s rejection is already an
//! `AdapterError` and passes through as is.
//!
//! A positive timeout and the caller's abort signal race the in-flight work.
//! Whichever finishes first decides the outcome, and the losers are dropped:
//! the timer goes away when the network wins, and the transport future is
//! cancelled (its `NativeRequest::signal` tripped) when the timer or the
//! signal wins.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, Span};
use url::Url;

use crate::body::RequestBody;
use crate::config::RequestConfig;
use crate::decode::{decode_body, ResponseType};
use crate::error::{AdapterError, ErrorCode};
use crate::headers::Headers;
use crate::http::{HttpMethod, NativeRequest};
use crate::response::AdapterResponse;
use crate::settle::settle;
use crate::transport::Fetch;
use crate::url_builder::{build_full_path, build_url};

/// The pluggable-transport signature the HTTP client calls.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn request(&self, config: RequestConfig) -> Result<AdapterResponse, AdapterError>;
}

/// Adapter that routes every request through a host-supplied `Fetch`.
#[derive(Debug, Clone)]
pub struct FetchAdapter<F> {
    fetch: F,
}

impl<F> FetchAdapter<F>
where
    F: Fetch,
{
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }

    pub fn transport(&self) -> &F {
        &self.fetch
    }

    /// Perform one request described by `config`.
    #[tracing::instrument(
        name = "fetch_adapter.request",
        skip_all,
        fields(method = field::Empty, url = field::Empty)
    )]
    pub async fn request(&self, mut config: RequestConfig) -> Result<AdapterResponse, AdapterError> {
        let full_path = build_full_path(
            config.base_url.as_deref(),
            config.url.as_deref().unwrap_or_default(),
            config.allow_absolute_urls,
        );
        let url = build_url(
            &full_path,
            config.params.as_ref(),
            config.params_serializer.as_ref(),
        );
        let response_type = ResponseType::from_config(config.response_type.as_deref());

        if config.data.as_ref().is_some_and(RequestBody::is_form_data) {
            config.headers.set_content_type(None);
        }
        config.headers.normalize(false);
        let config = Arc::new(config);

        let request = Arc::new(native_request(&config, &url)?);
        let span = Span::current();
        span.record("method", request.method.as_str());
        span.record("url", request.url.as_str());

        if config
            .signal
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(AdapterError::canceled(config, Some(request)));
        }

        let in_flight = self.dispatch(config.clone(), request.clone(), response_type);
        let timer = async {
            if config.timeout > 0 {
                tokio::time::sleep(Duration::from_millis(config.timeout)).await
            } else {
                future::pending().await
            }
        };
        let aborted = async {
            match &config.signal {
                Some(signal) => signal.cancelled().await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            biased;
            result = in_flight => result,
            () = aborted => {
                debug!("request canceled by caller");
                request.signal.cancel();
                Err(AdapterError::canceled(config.clone(), Some(request.clone())))
            }
            () = timer => {
                debug!(timeout_ms = config.timeout, "request timed out");
                request.signal.cancel();
                Err(AdapterError::timeout(config.timeout, config.clone(), Some(request.clone())))
            }
        }
    }

    async fn dispatch(
        &self,
        config: Arc<RequestConfig>,
        request: Arc<NativeRequest>,
        response_type: ResponseType,
    ) -> Result<AdapterResponse, AdapterError> {
        debug!("dispatching to transport");
        let response = match self.fetch.fetch(&request).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, code = err.code(), "transport failed");
                let code = err.code().map(ErrorCode::from_token);
                return Err(AdapterError::from_source(err, code, config, Some(request)));
            }
        };

        let status = response.status;
        let status_text = response.status_text.clone();
        let mut headers = Headers::from_pairs(response.headers.iter().cloned());
        headers.normalize(false);
        debug!(status, %response_type, "response received");

        let data = decode_body(response, &response_type).await.map_err(|err| {
            let code = err.code().map(ErrorCode::from_token);
            AdapterError::from_source(err, code, config.clone(), Some(request.clone()))
        })?;

        settle(AdapterResponse {
            data,
            status,
            status_text,
            headers,
            config,
            request,
        })
    }
}

#[async_trait]
impl<F> Adapter for FetchAdapter<F>
where
    F: Fetch,
{
    async fn request(&self, config: RequestConfig) -> Result<AdapterResponse, AdapterError> {
        FetchAdapter::request(self, config).await
    }
}

fn native_request(config: &Arc<RequestConfig>, url: &str) -> Result<NativeRequest, AdapterError> {
    let method = HttpMethod::parse(config.method.as_deref().unwrap_or("get")).map_err(|err| {
        AdapterError::from_source(err, Some(ErrorCode::BadOptionValue), config.clone(), None)
    })?;
    let url = Url::parse(url).map_err(|err| {
        AdapterError::from_source(err, Some(ErrorCode::InvalidUrl), config.clone(), None)
    })?;
    let signal = config
        .signal
        .as_ref()
        .map(CancellationToken::child_token)
        .unwrap_or_default();
    Ok(NativeRequest {
        url,
        method,
        headers: config.headers.to_pairs(),
        body: config.data.clone(),
        options: config.fetch_options.clone(),
        signal,
    })
}
