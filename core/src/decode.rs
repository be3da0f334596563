//! Response body decoding by requested response type.
//!
//! # Design
//! The mode is resolved before the body is touched, and `decode_body` takes
//! the `NativeResponse` by value, so the body stream is read exactly once.
//! Every mode buffers the whole body.

use std::fmt;

use thiserror::Error;

use crate::error::TransportError;
use crate::http::NativeResponse;
use crate::response::{Blob, ResponseData};

/// Canonical response type token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseType {
    ArrayBuffer,
    Blob,
    Json,
    Text,
    /// Any other token (`document`, `stream`, ...), decoded as text.
    Other(String),
}

impl ResponseType {
    /// Lowercase the configured token; absent or empty means text.
    pub fn from_config(value: Option<&str>) -> Self {
        let token = match value {
            Some(token) if !token.is_empty() => token.to_lowercase(),
            _ => return Self::Text,
        };
        match token.as_str() {
            "arraybuffer" => Self::ArrayBuffer,
            "blob" => Self::Blob,
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Other(token),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ArrayBuffer => "arraybuffer",
            Self::Blob => "blob",
            Self::Json => "json",
            Self::Text => "text",
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Body(#[from] TransportError),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    /// Classification code of a failed body read, if the transport gave one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Body(err) => err.code(),
            Self::Json(_) => None,
        }
    }
}

/// Consume `response` and decode its body as `response_type`.
pub async fn decode_body(
    response: NativeResponse,
    response_type: &ResponseType,
) -> Result<ResponseData, DecodeError> {
    match response_type {
        ResponseType::Json => {
            let bytes = response.bytes().await?;
            Ok(ResponseData::Json(serde_json::from_slice(&bytes)?))
        }
        ResponseType::Blob => {
            let content_type = response.header("content-type").map(str::to_string);
            let bytes = response.bytes().await?;
            Ok(ResponseData::Blob(Blob::new(bytes, content_type.as_deref())))
        }
        ResponseType::ArrayBuffer => Ok(ResponseData::ArrayBuffer(response.bytes().await?)),
        ResponseType::Text | ResponseType::Other(_) => Ok(ResponseData::Text(response.text().await?)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(body: &'static str, content_type: Option<&str>) -> NativeResponse {
        let headers = content_type
            .map(|ct| vec![("content-type".to_string(), ct.to_string())])
            .unwrap_or_default();
        NativeResponse::new(200, "OK", headers, body)
    }

    #[test]
    fn response_type_normalization() {
        assert_eq!(ResponseType::from_config(None), ResponseType::Text);
        assert_eq!(ResponseType::from_config(Some("")), ResponseType::Text);
        assert_eq!(ResponseType::from_config(Some("JSON")), ResponseType::Json);
        assert_eq!(ResponseType::from_config(Some("ArrayBuffer")), ResponseType::ArrayBuffer);
        assert_eq!(
            ResponseType::from_config(Some("Document")),
            ResponseType::Other("document".to_string())
        );
    }

    #[tokio::test]
    async fn json_mode_parses() {
        let data = decode_body(response(r#"{"a":1}"#, None), &ResponseType::Json)
            .await
            .unwrap();
        assert_eq!(data, ResponseData::Json(json!({"a": 1})));
    }

    #[tokio::test]
    async fn json_mode_propagates_parse_failure() {
        let err = decode_body(response("not json", None), &ResponseType::Json)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
        assert!(err.code().is_none());
    }

    #[tokio::test]
    async fn empty_body_is_not_json() {
        let err = decode_body(response("", None), &ResponseType::Json)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[tokio::test]
    async fn blob_mode_carries_content_type() {
        let data = decode_body(response("abc", Some("Text/Plain")), &ResponseType::Blob)
            .await
            .unwrap();
        let blob = data.as_blob().unwrap();
        assert_eq!(blob.content_type(), Some("text/plain"));
        assert_eq!(blob.size(), 3);
    }

    #[tokio::test]
    async fn blob_mode_without_content_type_is_untyped() {
        let data = decode_body(response("abc", None), &ResponseType::Blob)
            .await
            .unwrap();
        assert_eq!(data.as_blob().unwrap().content_type(), None);
    }

    #[tokio::test]
    async fn arraybuffer_mode_keeps_byte_length() {
        let body = "héllo";
        let data = decode_body(response(body, Some("text/plain")), &ResponseType::ArrayBuffer)
            .await
            .unwrap();
        assert_eq!(data.as_bytes().unwrap().len(), body.len());
    }

    #[tokio::test]
    async fn unknown_modes_fall_back_to_text() {
        let data = decode_body(
            response("<p>hi</p>", Some("text/html")),
            &ResponseType::Other("document".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(data.as_text(), Some("<p>hi</p>"));
    }
}
