//! Native request and response types exchanged with the host transport.
//!
//! # Design
//! These describe one HTTP round-trip as plain data. The adapter builds a
//! `NativeRequest`; the host executes it and hands back a `NativeResponse`.
//! The response body is consumed by value (`bytes`, `text`), so it can
//! only ever be read once.

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::stream::{Stream, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::body::RequestBody;
use crate::config::FetchOptions;
use crate::error::TransportError;

/// HTTP method of a native request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    /// Any other token, stored uppercase.
    Other(String),
}

#[derive(Debug, Error)]
#[error("invalid HTTP method: {0:?}")]
pub struct InvalidMethod(pub String);

impl HttpMethod {
    /// Parse case-insensitively. The result renders uppercase.
    pub fn parse(method: &str) -> Result<Self, InvalidMethod> {
        let upper = method.to_ascii_uppercase();
        let is_token = !upper.is_empty()
            && upper
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
        if !is_token {
            return Err(InvalidMethod(method.to_string()));
        }
        Ok(match upper.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => Self::Other(upper),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Other(method) => method,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready for the host transport.
#[derive(Debug, Clone)]
pub struct NativeRequest {
    pub url: Url,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub options: FetchOptions,
    /// Tripped when the adapter gives up on the request (timeout or caller
    /// abort). Transports may watch it to stop work early.
    pub signal: CancellationToken,
}

impl NativeRequest {
    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Response body: fully buffered, or a stream of chunks still arriving.
pub enum ResponseBody {
    Full(Bytes),
    Stream(BodyStream),
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self::Full(Bytes::new())
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    /// Read every remaining chunk.
    pub async fn collect(self) -> Result<Bytes, TransportError> {
        match self {
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(Bytes::from(bytes))
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        Self::Full(Bytes::from(text))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(text: &'static str) -> Self {
        Self::Full(Bytes::from_static(text.as_bytes()))
    }
}

/// A response returned by the host transport.
#[derive(Debug)]
pub struct NativeResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    body: ResponseBody,
}

impl NativeResponse {
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: Vec<(String, String)>,
        body: impl Into<ResponseBody>,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            body: body.into(),
        }
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        self.body.collect().await
    }

    /// Body as UTF-8, invalid sequences replaced.
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
