//! The host transport seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{NativeRequest, NativeResponse};

/// Performs the actual network round-trip for a `NativeRequest`.
///
/// Implementations own connection handling, TLS, redirects, and cookies.
/// They should report failures as `TransportError`, with a `code` when the
/// failure has a well-known classification (`ERR_NETWORK`, `ETIMEDOUT`, ...).
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &NativeRequest) -> Result<NativeResponse, TransportError>;
}

#[async_trait]
impl<T> Fetch for Arc<T>
where
    T: Fetch + ?Sized,
{
    async fn fetch(&self, request: &NativeRequest) -> Result<NativeResponse, TransportError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Fetch for Box<T>
where
    T: Fetch + ?Sized,
{
    async fn fetch(&self, request: &NativeRequest) -> Result<NativeResponse, TransportError> {
        (**self).fetch(request).await
    }
}
