//! Key-value containers carried by a request.

use std::collections::BTreeMap;

use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;

/// Server/environment metadata keys.
pub mod keys {
    /// Filesystem path of the entry point; rewritten to the mount root on dispatch.
    pub const SCRIPT_FILENAME: &str = "SCRIPT_FILENAME";
    /// URL path of the entry point; drives `Request::base_url`.
    pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
    /// URL path the handler believes it is served from.
    pub const SELF_PATH: &str = "SELF_PATH";
    pub const REQUEST_URI: &str = "REQUEST_URI";
    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
    pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
    /// Prefix of header-derived entries (`HTTP_USER_AGENT`, ...).
    pub const HTTP_PREFIX: &str = "HTTP_";
}

/// Ordered string map (query parameters, form fields, cookies).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterBag(BTreeMap<String, String>);

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Server/environment-like metadata (CGI style keys, see [`keys`]).
pub type ServerBag = ParameterBag;

/// Free-form annotations attached to a request by middleware and routing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeBag(BTreeMap<String, Value>);

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String view of an attribute; `None` for missing or non-string values.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A file uploaded with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-side file name.
    pub name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

/// Uploaded files keyed by form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBag(BTreeMap<String, UploadedFile>);

impl FileBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&UploadedFile> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, file: UploadedFile) {
        self.0.insert(field.into(), file);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse `Cookie` header values (`a=1; b=2`) into a bag.
///
/// Pairs without `=` are skipped; the first occurrence of a name wins.
pub fn parse_cookies<'a>(headers: impl IntoIterator<Item = &'a str>) -> ParameterBag {
    let mut bag = ParameterBag::new();
    for header in headers {
        for pair in header.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() && !bag.contains(name) {
                    bag.set(name, value.trim());
                }
            }
        }
    }
    bag
}
