//! Response value produced by handlers.
//!
//! # Design Decisions
//! - Body is fully buffered (`Bytes`); handlers are synchronous
//! - Conversion to an axum response happens only at the transport edge

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

/// A buffered response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Response with the given status and body, no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// `200 OK` plain-text response.
    pub fn text(body: impl Into<String>) -> Self {
        let body: String = body.into();
        let mut res = Self::new(StatusCode::OK, body);
        res.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    }

    /// `200 OK` JSON response.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let mut res = Self::new(StatusCode::OK, serde_json::to_vec(value)?);
        res.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(res)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Convert into an axum response.
    pub fn into_http(self) -> axum::response::Response {
        let mut res = axum::response::Response::new(Body::from(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}
