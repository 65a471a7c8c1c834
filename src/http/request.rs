//! Request value handled by the dispatcher and its sub-handlers.
//!
//! # Responsibilities
//! - Carry method, headers, body and the parameter/server/attribute bags
//! - Derive base URL and path info from server metadata
//! - Duplicate a request with selected bags replaced
//! - Build from an `http::Request` head plus buffered body
//!
//! # Design Decisions
//! - Base URL and path info are recomputed on every call, never cached, so a
//!   duplicate with a new `SCRIPT_NAME` reports its own mount point
//! - Raw (still encoded) path is kept; decoding happens only for comparison

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method};

use crate::http::bags::{
    keys, parse_cookies, AttributeBag, FileBag, ParameterBag, ServerBag, UploadedFile,
};
use crate::routing::path::encoded_prefix;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request as seen by handlers.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    headers: HeaderMap,
    body: Bytes,
    query: ParameterBag,
    form: ParameterBag,
    cookies: ParameterBag,
    files: FileBag,
    server: ServerBag,
    attributes: AttributeBag,
}

/// Bags to replace when duplicating a request. Unset fields are copied.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub query: Option<ParameterBag>,
    pub form: Option<ParameterBag>,
    pub attributes: Option<AttributeBag>,
    pub cookies: Option<ParameterBag>,
    pub files: Option<FileBag>,
    pub server: Option<ServerBag>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: ParameterBag) -> Self {
        self.query = Some(query);
        self
    }

    pub fn form(mut self, form: ParameterBag) -> Self {
        self.form = Some(form);
        self
    }

    pub fn attributes(mut self, attributes: AttributeBag) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn cookies(mut self, cookies: ParameterBag) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn files(mut self, files: FileBag) -> Self {
        self.files = Some(files);
        self
    }

    pub fn server(mut self, server: ServerBag) -> Self {
        self.server = Some(server);
        self
    }
}

impl Request {
    /// Start building a request by hand.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Build a request from an HTTP head and its buffered body.
    pub fn from_http(parts: &Parts, body: Bytes) -> Self {
        let request_uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let query_string = parts.uri.query().unwrap_or("");

        let mut server = ServerBag::new();
        server.set(keys::REQUEST_METHOD, parts.method.as_str());
        server.set(keys::REQUEST_URI, request_uri);
        server.set(keys::QUERY_STRING, query_string);
        server.set(keys::SERVER_PROTOCOL, format!("{:?}", parts.version));
        server.set(keys::SCRIPT_NAME, "");
        server.set(keys::SCRIPT_FILENAME, "");
        server.set(keys::SELF_PATH, "");
        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            server.set(keys::REMOTE_ADDR, addr.ip().to_string());
        }
        for name in parts.headers.keys() {
            let values: Vec<&str> = parts
                .headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            if !values.is_empty() {
                server.set(server_key(name), values.join(", "));
            }
        }

        let is_form = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));
        let form = if is_form {
            url::form_urlencoded::parse(&body).into_owned().collect()
        } else {
            ParameterBag::new()
        };

        let cookies = parse_cookies(
            parts
                .headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        Self {
            method: parts.method.clone(),
            headers: parts.headers.clone(),
            body,
            query: parse_query(query_string),
            form,
            cookies,
            files: FileBag::new(),
            server,
            attributes: AttributeBag::new(),
        }
    }

    /// Copy this request, replacing only the bags present in `overrides`.
    pub fn duplicate(&self, overrides: Overrides) -> Self {
        Self {
            method: self.method.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            query: overrides.query.unwrap_or_else(|| self.query.clone()),
            form: overrides.form.unwrap_or_else(|| self.form.clone()),
            cookies: overrides.cookies.unwrap_or_else(|| self.cookies.clone()),
            files: overrides.files.unwrap_or_else(|| self.files.clone()),
            server: overrides.server.unwrap_or_else(|| self.server.clone()),
            attributes: overrides
                .attributes
                .unwrap_or_else(|| self.attributes.clone()),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn query(&self) -> &ParameterBag {
        &self.query
    }

    /// Form fields of a url-encoded body.
    pub fn form(&self) -> &ParameterBag {
        &self.form
    }

    pub fn cookies(&self) -> &ParameterBag {
        &self.cookies
    }

    pub fn files(&self) -> &FileBag {
        &self.files
    }

    pub fn server(&self) -> &ServerBag {
        &self.server
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeBag {
        &mut self.attributes
    }

    /// Original request target (path and query), `/` when unknown.
    pub fn request_uri(&self) -> &str {
        self.server.get(keys::REQUEST_URI).unwrap_or("/")
    }

    /// Request target without the query string, still percent-encoded.
    pub fn raw_path(&self) -> &str {
        let uri = self.request_uri();
        uri.split_once('?').map_or(uri, |(path, _)| path)
    }

    /// Path under which the handling application is mounted.
    ///
    /// This is the `SCRIPT_NAME` when the request path starts with it, spelled
    /// the way the client encoded it. Empty otherwise.
    pub fn base_url(&self) -> &str {
        let script_name = self.server.get(keys::SCRIPT_NAME).unwrap_or("");
        if script_name.is_empty() {
            return "";
        }
        let raw = self.raw_path();
        // decoded comparison first: a `%` in SCRIPT_NAME is a literal byte
        if let Some(prefix) = encoded_prefix(raw, script_name.as_bytes()) {
            return prefix;
        }
        if raw.starts_with(script_name) {
            return &raw[..script_name.len()];
        }
        ""
    }

    /// Raw path relative to [`base_url`](Self::base_url), `/` when empty.
    pub fn path_info(&self) -> &str {
        let raw = self.raw_path();
        match &raw[self.base_url().len()..] {
            "" => "/",
            rest => rest,
        }
    }
}

/// Builder for hand-made requests (tests, internal sub-requests).
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    form: ParameterBag,
    cookies: ParameterBag,
    files: FileBag,
    server: ServerBag,
    attributes: AttributeBag,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Request target, e.g. `/blog/post?id=3`.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.set(key, value);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.set(name, value);
        self
    }

    pub fn file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.set(field, file);
        self
    }

    /// Set a raw server entry; applied after the derived entries.
    pub fn server(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server.set(key, value);
        self
    }

    /// Mount the request under `script_name` (sets `SCRIPT_NAME`).
    pub fn script_name(self, script_name: impl Into<String>) -> Self {
        self.server(keys::SCRIPT_NAME, script_name)
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.set(key, value);
        self
    }

    pub fn build(self) -> Request {
        let method = self.method.unwrap_or(Method::GET);
        let uri = self.uri.unwrap_or_else(|| "/".to_string());
        let query_string = uri.split_once('?').map_or("", |(_, q)| q).to_string();

        let mut server = ServerBag::new();
        server.set(keys::REQUEST_METHOD, method.as_str());
        server.set(keys::REQUEST_URI, uri.as_str());
        server.set(keys::QUERY_STRING, query_string.as_str());
        for name in self.headers.keys() {
            if let Some(value) = self.headers.get(name).and_then(|v| v.to_str().ok()) {
                server.set(server_key(name), value);
            }
        }
        for (key, value) in self.server.iter() {
            server.set(key, value);
        }

        Request {
            method,
            headers: self.headers,
            body: self.body,
            query: parse_query(&query_string),
            form: self.form,
            cookies: self.cookies,
            files: self.files,
            server,
            attributes: self.attributes,
        }
    }
}

fn parse_query(query_string: &str) -> ParameterBag {
    url::form_urlencoded::parse(query_string.as_bytes())
        .into_owned()
        .collect()
}

/// `user-agent` -> `HTTP_USER_AGENT`.
fn server_key(name: &HeaderName) -> String {
    let mut key = String::with_capacity(keys::HTTP_PREFIX.len() + name.as_str().len());
    key.push_str(keys::HTTP_PREFIX);
    key.extend(
        name.as_str()
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() }),
    );
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    #[test]
    fn test_base_url_and_path_info_follow_script_name() {
        let req = Request::builder().uri("/api/v2/users?page=2").build();
        assert_eq!(req.base_url(), "");
        assert_eq!(req.path_info(), "/api/v2/users");

        let mounted = Request::builder()
            .uri("/api/v2/users?page=2")
            .script_name("/api")
            .build();
        assert_eq!(mounted.base_url(), "/api");
        assert_eq!(mounted.path_info(), "/v2/users");
        assert_eq!(mounted.query().get("page"), Some("2"));
    }

    #[test]
    fn test_base_url_keeps_client_encoding() {
        let req = Request::builder()
            .uri("/api%2Fv2/x")
            .script_name("/api/v2")
            .build();
        assert_eq!(req.base_url(), "/api%2Fv2");
        assert_eq!(req.path_info(), "/x");
    }

    #[test]
    fn test_literal_percent_in_script_name_matches_encoded_path() {
        let req = Request::builder()
            .uri("/100%25/x")
            .script_name("/100%")
            .build();
        assert_eq!(req.base_url(), "/100%25");
        assert_eq!(req.path_info(), "/x");

        // an already-encoded script name still matches literally
        let encoded = Request::builder()
            .uri("/100%25/x/y")
            .script_name("/100%25/x")
            .build();
        assert_eq!(encoded.base_url(), "/100%25/x");
        assert_eq!(encoded.path_info(), "/y");
    }

    #[test]
    fn test_unrelated_script_name_is_ignored() {
        let req = Request::builder().uri("/shop").script_name("/blog").build();
        assert_eq!(req.base_url(), "");
        assert_eq!(req.path_info(), "/shop");

        let exact = Request::builder().uri("/blog").script_name("/blog").build();
        assert_eq!(exact.path_info(), "/");
    }

    #[test]
    fn test_duplicate_replaces_only_given_bags() {
        let original = Request::builder()
            .method(Method::POST)
            .uri("/form?x=1")
            .body("payload")
            .form_field("name", "ferris")
            .cookie("sid", "42")
            .attribute("seen", true)
            .build();

        let mut server = original.server().clone();
        server.set(keys::SCRIPT_NAME, "/form");
        let copy = original.duplicate(Overrides::new().server(server));

        assert_eq!(copy.method(), &Method::POST);
        assert_eq!(copy.body().as_ref(), b"payload");
        assert_eq!(copy.query(), original.query());
        assert_eq!(copy.form(), original.form());
        assert_eq!(copy.cookies(), original.cookies());
        assert_eq!(copy.attributes(), original.attributes());
        assert_eq!(copy.server().get(keys::SCRIPT_NAME), Some("/form"));
        assert_eq!(original.server().get(keys::SCRIPT_NAME), None);
    }

    #[test]
    fn test_from_http() {
        let http = HttpRequest::builder()
            .method("POST")
            .uri("http://example.com/blog/new?draft=1")
            .header("User-Agent", "test-agent")
            .header("Cookie", "sid=abc")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap();
        let (parts, ()) = http.into_parts();
        let req = Request::from_http(&parts, Bytes::from_static(b"title=Hello+World"));

        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.request_uri(), "/blog/new?draft=1");
        assert_eq!(req.raw_path(), "/blog/new");
        assert_eq!(req.query().get("draft"), Some("1"));
        assert_eq!(req.form().get("title"), Some("Hello World"));
        assert_eq!(req.cookies().get("sid"), Some("abc"));
        assert_eq!(req.server().get("HTTP_USER_AGENT"), Some("test-agent"));
        assert_eq!(req.server().get(keys::SERVER_PROTOCOL), Some("HTTP/1.1"));
        assert_eq!(req.server().get(keys::SCRIPT_NAME), Some(""));
        assert_eq!(req.base_url(), "");
    }
}
