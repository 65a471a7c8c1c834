//! Bridge from tower/axum to a synchronous [`Handler`].
//!
//! # Responsibilities
//! - Buffer the request body (bounded) and build a [`Request`]
//! - Run one main request through the handler with `catch` enabled
//! - Render uncaught handler errors as responses
//! - Call `terminate` once per request/response cycle
//!
//! # Design Decisions
//! - Termination runs after the response is fully determined and before it is
//!   handed back to the server; it is not cancellable
//! - Oversized or broken bodies never reach the handler

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request as HttpRequest, StatusCode};
use tower::Service;

use crate::http::{Request, Response};
use crate::kernel::{Handler, RequestType};

/// Default body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// `tower::Service` serving HTTP requests with a [`Handler`].
pub struct KernelService<H: ?Sized> {
    handler: Arc<H>,
    max_body_bytes: usize,
}

impl<H: ?Sized> KernelService<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }
}

impl<H: ?Sized> Clone for KernelService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl<H: ?Sized> fmt::Debug for KernelService<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelService")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl<H> Service<HttpRequest<Body>> for KernelService<H>
where
    H: Handler + ?Sized + 'static,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: HttpRequest<Body>) -> Self::Future {
        let handler = self.handler.clone();
        let limit = self.max_body_bytes;
        Box::pin(async move { Ok(serve(&*handler, request, limit).await) })
    }
}

async fn serve<H>(handler: &H, request: HttpRequest<Body>, limit: usize) -> axum::response::Response
where
    H: Handler + ?Sized,
{
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit, "Request body rejected");
            return Response::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body rejected")
                .into_http();
        }
    };

    let request = Request::from_http(&parts, body);
    let response = match handler.handle(&request, RequestType::Main, true) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, path = %request.raw_path(), "Handler failed");
            e.into_response()
        }
    };

    if let Some(terminable) = handler.as_terminable() {
        terminable.terminate(&request, &response);
    }

    response.into_http()
}
