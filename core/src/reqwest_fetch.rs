//! `Fetch` implementation backed by `reqwest`.
//!
//! # Design
//! Hosts without their own network stack can plug this in directly. The
//! shared `reqwest::Client` is reused unless the request's `FetchOptions`
//! ask for a redirect policy or connect timeout that differs from the
//! defaults, in which case a one-off client is built for that request.
//! Response bodies are streamed; the adapter's decoder buffers them.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{multipart, redirect, Client, Method, RequestBuilder};
use tracing::debug;

use crate::body::{FormData, FormValue, RequestBody};
use crate::config::{FetchOptions, RedirectPolicy};
use crate::error::TransportError;
use crate::http::{NativeRequest, NativeResponse, ResponseBody};
use crate::transport::Fetch;

const DEFAULT_MAX_REDIRECTIONS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn client_for(&self, options: &FetchOptions) -> Result<Client, TransportError> {
        if options.redirect == RedirectPolicy::Follow
            && options.max_redirections.is_none()
            && options.connect_timeout.is_none()
        {
            return Ok(self.client.clone());
        }
        let policy = match options.redirect {
            RedirectPolicy::Follow => {
                redirect::Policy::limited(options.max_redirections.unwrap_or(DEFAULT_MAX_REDIRECTIONS))
            }
            RedirectPolicy::Manual => redirect::Policy::none(),
            RedirectPolicy::Error => {
                redirect::Policy::custom(|attempt| attempt.error("redirects are not allowed"))
            }
        };
        let mut builder = Client::builder().redirect(policy);
        if let Some(ms) = options.connect_timeout {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        builder.build().map_err(transport_error)
    }
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn fetch(&self, request: &NativeRequest) -> Result<NativeResponse, TransportError> {
        let client = self.client_for(&request.options)?;
        let method = Method::from_bytes(request.method.as_str().as_bytes()).map_err(|err| {
            TransportError::new(err.to_string())
                .with_code("ERR_BAD_OPTION_VALUE")
                .with_source(err)
        })?;

        let mut builder = client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = with_body(builder, body, request.header("content-type").is_some())?;
        }

        debug!(method = %request.method, url = %request.url, "sending request");
        let response = tokio::select! {
            biased;
            () = request.signal.cancelled() => {
                return Err(TransportError::new("request aborted").with_code("ERR_CANCELED"));
            }
            sent = builder.send() => sent.map_err(transport_error)?,
        };

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        debug!(status = status.as_u16(), "response headers received");
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(transport_error));

        Ok(NativeResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            ResponseBody::from_stream(body),
        ))
    }
}

fn with_body(
    builder: RequestBuilder,
    body: &RequestBody,
    has_content_type: bool,
) -> Result<RequestBuilder, TransportError> {
    let with_default_type = |builder: RequestBuilder, content_type: &str| {
        if has_content_type {
            builder
        } else {
            builder.header(reqwest::header::CONTENT_TYPE, content_type)
        }
    };
    Ok(match body {
        RequestBody::Text(text) => {
            with_default_type(builder, "text/plain;charset=UTF-8").body(text.clone())
        }
        RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
        RequestBody::UrlEncoded(encoded) => {
            with_default_type(builder, "application/x-www-form-urlencoded;charset=UTF-8")
                .body(encoded.clone())
        }
        RequestBody::Form(form) => builder.multipart(multipart_form(form)?),
    })
}

fn multipart_form(form: &FormData) -> Result<multipart::Form, TransportError> {
    let mut out = multipart::Form::new();
    for part in form.parts() {
        out = match &part.value {
            FormValue::Text(text) => out.text(part.name.clone(), text.clone()),
            FormValue::File {
                filename,
                content_type,
                bytes,
            } => {
                let mut file = multipart::Part::bytes(bytes.to_vec());
                if let Some(filename) = filename {
                    file = file.file_name(filename.clone());
                }
                if let Some(content_type) = content_type {
                    file = file.mime_str(content_type).map_err(transport_error)?;
                }
                out.part(part.name.clone(), file)
            }
        };
    }
    Ok(out)
}

fn transport_error(err: reqwest::Error) -> TransportError {
    let code = if err.is_timeout() {
        "ETIMEDOUT"
    } else if err.is_redirect() {
        "ERR_FR_TOO_MANY_REDIRECTS"
    } else if err.is_builder() {
        "ERR_BAD_OPTION_VALUE"
    } else {
        "ERR_NETWORK"
    };
    TransportError::new(err.to_string())
        .with_code(code)
        .with_source(err)
}
