//! Request URL construction: base + path joining and query serialization.
//!
//! # Design
//! These follow the wrapped client's helpers exactly, because callers rely on
//! identical URLs whichever transport is plugged in:
//! - `build_full_path` only joins when the requested URL is relative (or
//!   absolute URLs are disallowed).
//! - `combine_urls` strips at most two trailing slashes from the base and all
//!   leading slashes from the path.
//! - Query maps are flattened bracket-style (`a[b]=1`, `ids[]=1`) and encoded
//!   like `encodeURIComponent`, except that `: $ , [ ]` stay literal and
//!   spaces become `+`.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::Params;

type SerializeFn = dyn Fn(&Params) -> String + Send + Sync;
type EncodeFn = dyn Fn(&str) -> String + Send + Sync;

/// How flat arrays in a query map are keyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayFormat {
    /// `ids[]=1&ids[]=2`
    #[default]
    Brackets,
    /// `ids[0]=1&ids[1]=2`
    Indexes,
    /// `ids=1&ids=2`
    Repeat,
}

/// Options for the built-in query serializer.
#[derive(Clone, Default)]
pub struct SerializeOptions {
    pub indexes: ArrayFormat,
    /// Join nested keys with `.` instead of brackets.
    pub dots: bool,
    /// Replaces the default component encoder.
    pub encode: Option<Arc<EncodeFn>>,
}

impl fmt::Debug for SerializeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeOptions")
            .field("indexes", &self.indexes)
            .field("dots", &self.dots)
            .field("encode", &self.encode.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Query serialization strategy.
#[derive(Clone)]
pub enum ParamsSerializer {
    Options(SerializeOptions),
    Custom(Arc<SerializeFn>),
}

impl ParamsSerializer {
    pub fn custom<F>(serialize: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(serialize))
    }
}

impl Default for ParamsSerializer {
    fn default() -> Self {
        Self::Options(SerializeOptions::default())
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Options(options) => f.debug_tuple("Options").field(options).finish(),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// `true` for `scheme://...` and protocol-relative `//...` URLs.
pub fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    let Some(colon) = url.find(':') else {
        return false;
    };
    let mut scheme = url[..colon].chars();
    scheme.next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && url[colon + 1..].starts_with("//")
}

pub fn combine_urls(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    let base = base.strip_suffix('/').unwrap_or(base);
    let base = base.strip_suffix('/').unwrap_or(base);
    format!("{base}/{}", relative.trim_start_matches('/'))
}

pub fn build_full_path(base: Option<&str>, requested: &str, allow_absolute_urls: bool) -> String {
    match base {
        Some(base)
            if !base.is_empty() && (!is_absolute_url(requested) || !allow_absolute_urls) =>
        {
            combine_urls(base, requested)
        }
        _ => requested.to_string(),
    }
}

/// Append serialized `params` to `url`. A fragment is dropped when a query
/// string is added.
pub fn build_url(url: &str, params: Option<&Params>, serializer: Option<&ParamsSerializer>) -> String {
    let Some(params) = params else {
        return url.to_string();
    };
    let serialized = match (serializer, params) {
        (Some(ParamsSerializer::Custom(serialize)), _) => serialize(params),
        (_, Params::Encoded(encoded)) => encoded.clone(),
        (Some(ParamsSerializer::Options(options)), Params::Map(map)) => serialize_map(map, options),
        (None, Params::Map(map)) => serialize_map(map, &SerializeOptions::default()),
    };
    if serialized.is_empty() {
        return url.to_string();
    }
    let url = url.split_once('#').map_or(url, |(head, _)| head);
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{serialized}")
}

fn serialize_map(map: &Map<String, Value>, options: &SerializeOptions) -> String {
    let mut pairs = Vec::new();
    flatten_top(map, options, &mut pairs);
    let encoder: &dyn Fn(&str) -> String = match &options.encode {
        Some(custom) => custom.as_ref(),
        None => &encode,
    };
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encoder(key), encoder(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn flatten_top(map: &Map<String, Value>, options: &SerializeOptions, pairs: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let key = key.trim();
        match value {
            Value::Null => {}
            Value::Object(_) | Value::Array(_) if key.ends_with("{}") => {
                pairs.push((key.to_string(), value.to_string()));
            }
            Value::Array(items) if items.iter().all(is_scalar) => {
                let key = key.strip_suffix("[]").unwrap_or(key);
                for (index, item) in items.iter().enumerate().filter(|(_, v)| !v.is_null()) {
                    let name = match options.indexes {
                        ArrayFormat::Brackets => format!("{key}[]"),
                        ArrayFormat::Repeat => key.to_string(),
                        ArrayFormat::Indexes => {
                            render_key(&[key.to_string(), index.to_string()], options.dots)
                        }
                    };
                    pairs.push((name, scalar_text(item)));
                }
            }
            Value::Object(_) | Value::Array(_) => {
                flatten_nested(value, &mut vec![key.to_string()], options, pairs);
            }
            scalar => pairs.push((key.to_string(), scalar_text(scalar))),
        }
    }
}

fn flatten_nested(
    value: &Value,
    path: &mut Vec<String>,
    options: &SerializeOptions,
    pairs: &mut Vec<(String, String)>,
) {
    let children: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.trim().to_string(), v)).collect(),
        Value::Array(items) => items.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        _ => return,
    };
    for (key, child) in children {
        if child.is_null() {
            continue;
        }
        path.push(key);
        if is_scalar(child) {
            pairs.push((render_key(path, options.dots), scalar_text(child)));
        } else {
            flatten_nested(child, path, options, pairs);
        }
        path.pop();
    }
}

fn render_key(path: &[String], dots: bool) -> String {
    path.iter()
        .enumerate()
        .map(|(i, token)| {
            let token = token.strip_suffix("[]").unwrap_or(token);
            if !dots && i > 0 {
                format!("[{token}]")
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(if dots { "." } else { "" })
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `encodeURIComponent`, then `: $ , [ ]` restored and spaces as `+`.
pub fn encode(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes())
        .map(|chunk| match chunk {
            "%21" => "!",
            "%27" => "'",
            "%28" => "(",
            "%29" => ")",
            "%7E" => "~",
            "%3A" => ":",
            "%24" => "$",
            "%2C" => ",",
            "%5B" => "[",
            "%5D" => "]",
            other => other,
        })
        .collect()
}
