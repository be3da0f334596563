//! Pluggable HTTP client transport backed by a host-supplied fetch.
//!
//! # Overview
//! Translates a `RequestConfig` into a `NativeRequest`, hands it to a
//! host-provided `Fetch` implementation, decodes the `NativeResponse` body
//! according to the requested response type, and settles the result against
//! the configured status validator. Every failure leaving the adapter is an
//! `AdapterError`.
//!
//! # Design
//! - `FetchAdapter` is stateless apart from the transport it wraps; each call
//!   builds its request, response, and error values from scratch.
//! - The host owns all network I/O (connection handling, TLS, redirects).
//!   The crate ships `ReqwestFetch` as a ready-made host transport behind the
//!   `reqwest` feature.
//! - URL building, header normalization, and settling follow the wrapped
//!   client's rules exactly and live in their own modules so they can be
//!   tested in isolation.
//! - A positive timeout races the request against a timer. The loser is
//!   dropped: the timer is cleared when the network wins, and the transport
//!   future is cancelled (with its abort token tripped) when the timer wins.

pub mod adapter;
pub mod body;
pub mod config;
pub mod decode;
pub mod error;
pub mod headers;
pub mod http;
pub mod response;
#[cfg(feature = "reqwest")]
pub mod reqwest_fetch;
pub mod settle;
pub mod transport;
pub mod url_builder;

pub use adapter::{Adapter, FetchAdapter};
pub use body::{FormData, FormPart, FormValue, RequestBody};
pub use config::{FetchOptions, Params, RedirectPolicy, RequestConfig};
pub use decode::{decode_body, DecodeError, ResponseType};
pub use error::{AdapterError, BoxError, ErrorCode, TransportError};
pub use headers::{HeaderValue, Headers};
pub use http::{HttpMethod, InvalidMethod, NativeRequest, NativeResponse, ResponseBody};
pub use response::{AdapterResponse, Blob, ResponseData};
#[cfg(feature = "reqwest")]
pub use reqwest_fetch::ReqwestFetch;
pub use settle::{settle, ValidateStatus};
pub use transport::Fetch;
pub use url_builder::{
    build_full_path, build_url, combine_urls, is_absolute_url, ArrayFormat, ParamsSerializer,
    SerializeOptions,
};
