//! Status validation: the single place that decides whether a completed
//! round-trip resolves or rejects.

use std::fmt;
use std::sync::Arc;

use crate::error::{AdapterError, ErrorCode};
use crate::response::AdapterResponse;

/// Predicate deciding which statuses resolve.
#[derive(Clone)]
pub struct ValidateStatus(Arc<dyn Fn(u16) -> bool + Send + Sync>);

impl ValidateStatus {
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(validate))
    }

    pub fn check(&self, status: u16) -> bool {
        (self.0)(status)
    }
}

/// Accepts `200..300`.
impl Default for ValidateStatus {
    fn default() -> Self {
        Self::new(|status| (200..300).contains(&status))
    }
}

impl fmt::Debug for ValidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidateStatus(<fn>)")
    }
}

/// Resolve when the status is `0`, no validator is configured, or the
/// validator accepts it. Otherwise reject with the response attached:
/// 4xx as `ERR_BAD_REQUEST`, 5xx as `ERR_BAD_RESPONSE`, anything else
/// without a code.
pub fn settle(response: AdapterResponse) -> Result<AdapterResponse, AdapterError> {
    let accepted = match &response.config.validate_status {
        Some(validate) => response.status == 0 || validate.check(response.status),
        None => true,
    };
    if accepted {
        return Ok(response);
    }
    let code = match response.status / 100 {
        4 => Some(ErrorCode::BadRequest),
        5 => Some(ErrorCode::BadResponse),
        _ => None,
    };
    let err = AdapterError::new(
        format!("Request failed with status code {}", response.status),
        code,
        response.config.clone(),
        Some(response.request.clone()),
    );
    Err(err.with_response(response))
}
