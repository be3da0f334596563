//! Ordered, case-insensitive header collection.
//!
//! # Design
//! Names keep the casing they were first set with; lookups and merges compare
//! case-insensitively. A name may carry several values (`HeaderValue::Multi`),
//! which is how repeated response headers such as `set-cookie` survive
//! conversion from a native header list.

use std::borrow::Cow;

use serde::Deserialize;
use serde_json::Value;

/// One header's value or values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// All values joined with `", "`.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            Self::Single(value) => Cow::Borrowed(value),
            Self::Multi(values) => Cow::Owned(values.join(", ")),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn trimmed(self) -> Self {
        match self {
            Self::Single(value) => Self::Single(value.trim().to_string()),
            Self::Multi(values) => {
                Self::Multi(values.into_iter().map(|v| v.trim().to_string()).collect())
            }
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => *self = Self::Multi(vec![std::mem::take(first), value]),
            Self::Multi(values) => values.push(value),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// Header collection used on both the request configuration and the adapter
/// response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Map<String, Value>")]
pub struct Headers {
    entries: Vec<(String, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a native header list. Repeated names (compared
    /// case-insensitively) are grouped into one multi-value entry under the
    /// first name seen.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            let name = name.into();
            let value = value.into().trim().to_string();
            match headers.position(&name) {
                Some(index) => headers.entries[index].1.push(value),
                None => headers.entries.push((name, HeaderValue::Single(value))),
            }
        }
        headers
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.entries
            .iter()
            .position(|(key, _)| key.trim().eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.position(name).map(|index| &self.entries[index].1)
    }

    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a header, replacing any existing value. An existing entry keeps
    /// its original casing.
    pub fn set(&mut self, name: &str, value: impl Into<HeaderValue>) -> &mut Self {
        let value = value.into().trimmed();
        match self.position(name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self
    }

    /// Add a value without discarding existing ones.
    pub fn append(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into().trim().to_string();
        match self.position(name) {
            Some(index) => self.entries[index].1.push(value),
            None => self
                .entries
                .push((name.to_string(), HeaderValue::Single(value))),
        }
        self
    }

    /// Remove every entry matching `name`. Returns whether anything was
    /// removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.entries.len();
        self.entries
            .retain(|(key, _)| !key.trim().eq_ignore_ascii_case(name));
        before != self.entries.len()
    }

    pub fn content_type(&self) -> Option<Cow<'_, str>> {
        self.get("Content-Type").map(HeaderValue::joined)
    }

    /// `None` clears the content type so the transport can pick one.
    pub fn set_content_type(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => self.set("Content-Type", value),
            None => {
                self.remove("Content-Type");
                self
            }
        }
    }

    /// Trim names and fold case-insensitive duplicates into the first-seen
    /// name, the later value winning. With `format` set, names are also
    /// title-cased (`content-type` becomes `Content-Type`).
    pub fn normalize(&mut self, format: bool) -> &mut Self {
        let mut normalized: Vec<(String, HeaderValue)> = Vec::with_capacity(self.entries.len());
        for (name, value) in self.entries.drain(..) {
            let name = name.trim();
            if let Some(existing) = normalized
                .iter_mut()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
            {
                existing.1 = value;
                continue;
            }
            let name = if format {
                format_header(name)
            } else {
                name.to_string()
            };
            normalized.push((name, value));
        }
        self.entries = normalized;
        self
    }

    /// Plain key-value form: one pair per value, names in stored casing.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(name, value)| {
                value
                    .values()
                    .into_iter()
                    .map(move |v| (name.clone(), v.to_string()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<serde_json::Map<String, Value>> for Headers {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::String(s) => {
                    headers.set(&name, s);
                }
                Value::Array(items) => {
                    let values = items.iter().map(value_text).collect::<Vec<_>>();
                    headers.set(&name, values);
                }
                other => {
                    headers.set(&name, value_text(&other));
                }
            }
        }
        headers
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Title-case each word: an ASCII letter or digit that starts a run of word
/// characters is uppercased, everything else lowercased.
fn format_header(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if in_word {
            in_word = is_word;
            out.push(c);
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            in_word = true;
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json");
        assert!(headers.has("content-type"));
        assert_eq!(
            headers.get("CONTENT-TYPE"),
            Some(&HeaderValue::Single("application/json".to_string()))
        );
    }

    #[test]
    fn set_keeps_first_casing_and_trims() {
        let mut headers = Headers::new();
        headers.set("X-Token", "a");
        headers.set("x-token", "  b\r\n");
        assert_eq!(headers.to_pairs(), vec![("X-Token".to_string(), "b".to_string())]);
    }

    #[test]
    fn from_pairs_groups_repeated_names() {
        let headers = Headers::from_pairs([
            ("set-cookie", "a=1"),
            ("content-type", "text/plain"),
            ("Set-Cookie", "b=2"),
        ]);
        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get("set-cookie"),
            Some(&HeaderValue::Multi(vec!["a=1".to_string(), "b=2".to_string()]))
        );
        assert_eq!(
            headers.to_pairs(),
            vec![
                ("set-cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
                ("content-type".to_string(), "text/plain".to_string()),
            ]
        );
    }

    #[test]
    fn normalize_folds_duplicates_into_first_name() {
        let mut headers = Headers {
            entries: vec![
                ("Accept".to_string(), HeaderValue::from("text/html")),
                (" accept ".to_string(), HeaderValue::from("application/json")),
                ("X-Custom".to_string(), HeaderValue::from("1")),
            ],
        };
        headers.normalize(false);
        assert_eq!(
            headers.to_pairs(),
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Custom".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn normalize_with_format_title_cases() {
        let mut headers = Headers::from_pairs([("content-type", "a"), ("x-api_key", "b")]);
        headers.normalize(true);
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Content-Type", "X-Api_key"]);
    }

    #[test]
    fn normalize_without_format_preserves_casing() {
        let mut headers = Headers::from_pairs([("x-LOWER-upper", "v")]);
        headers.normalize(false);
        assert_eq!(headers.iter().next().map(|(name, _)| name), Some("x-LOWER-upper"));
    }

    #[test]
    fn clearing_content_type() {
        let mut headers = Headers::new();
        headers.set("content-type", "multipart/form-data");
        headers.set("Authorization", "Bearer t");
        headers.set_content_type(None);
        assert!(headers.content_type().is_none());
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn deserializes_from_json_object() {
        let headers: Headers = serde_json::from_value(serde_json::json!({
            "Accept": "application/json",
            "X-Ids": ["1", "2"],
            "X-Count": 3,
            "X-Skip": null,
            "X-Off": false
        }))
        .unwrap();
        assert_eq!(
            headers.to_pairs(),
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Ids".to_string(), "1".to_string()),
                ("X-Ids".to_string(), "2".to_string()),
                ("X-Count".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn joined_multi_value() {
        let value = HeaderValue::Multi(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(value.joined(), "a, b");
    }
}
