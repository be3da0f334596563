//! The response shape handed back to the HTTP client.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::config::RequestConfig;
use crate::headers::Headers;
use crate::http::NativeRequest;

/// Binary body tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content_type: Option<String>,
    bytes: Bytes,
}

impl Blob {
    /// The media type is stored lowercased; an empty one counts as absent.
    pub fn new(bytes: Bytes, content_type: Option<&str>) -> Self {
        Self {
            content_type: content_type
                .filter(|ct| !ct.is_empty())
                .map(str::to_ascii_lowercase),
            bytes,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Text(String),
    Json(Value),
    Blob(Blob),
    ArrayBuffer(Bytes),
}

impl ResponseData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Self::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::ArrayBuffer(bytes) => Some(bytes),
            Self::Blob(blob) => Some(blob.bytes()),
            _ => None,
        }
    }
}

/// What the adapter resolves with.
#[derive(Debug, Clone)]
pub struct AdapterResponse {
    pub data: ResponseData,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub config: Arc<RequestConfig>,
    pub request: Arc<NativeRequest>,
}
