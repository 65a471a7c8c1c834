//! Handler capability consumed and provided by the dispatcher.
//!
//! # Responsibilities
//! - Define the `Handler` contract (request in, response or error out)
//! - Model optional post-response termination as a capability query
//! - Provide a closure adapter for small sub-applications
//!
//! # Design Decisions
//! - Handlers borrow the request; the transport owns it for the whole cycle
//! - Termination is opt-in through `as_terminable`, no marker inheritance
//! - The `catch` flag is forwarded untouched; each handler owns its recovery policy

pub mod error;

use std::fmt;
use std::sync::Arc;

use crate::http::{Request, Response};

pub use error::{BoxError, HandlerError};

/// Kind of request being handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Top-level request produced by the transport.
    #[default]
    Main,
    /// Internal request issued while handling another one.
    Sub,
}

/// A request handler (sub-application, dispatcher or fallback).
pub trait Handler: Send + Sync {
    /// Handle a request and produce a response.
    ///
    /// When `catch` is true the handler is expected to turn its own failures into
    /// responses; when false they are returned to the caller.
    fn handle(
        &self,
        request: &Request,
        kind: RequestType,
        catch: bool,
    ) -> Result<Response, HandlerError>;

    /// Termination capability, if this handler supports it.
    fn as_terminable(&self) -> Option<&dyn Terminable> {
        None
    }
}

/// Post-response lifecycle hook.
pub trait Terminable: Send + Sync {
    /// Called once the response for `request` is fully determined.
    fn terminate(&self, request: &Request, response: &Response);
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle(
        &self,
        request: &Request,
        kind: RequestType,
        catch: bool,
    ) -> Result<Response, HandlerError> {
        (**self).handle(request, kind, catch)
    }

    fn as_terminable(&self) -> Option<&dyn Terminable> {
        (**self).as_terminable()
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle(
        &self,
        request: &Request,
        kind: RequestType,
        catch: bool,
    ) -> Result<Response, HandlerError> {
        (**self).handle(request, kind, catch)
    }

    fn as_terminable(&self) -> Option<&dyn Terminable> {
        (**self).as_terminable()
    }
}

type TerminateFn = Box<dyn Fn(&Request, &Response) + Send + Sync>;

/// Handler backed by a closure. See [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
    on_terminate: Option<TerminateFn>,
}

/// Wrap a closure into a [`Handler`].
///
/// With `catch` set, an `Err` from the closure is rendered through
/// [`HandlerError::into_response`] instead of being returned.
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request, RequestType) -> Result<Response, HandlerError> + Send + Sync,
{
    HandlerFn {
        f,
        on_terminate: None,
    }
}

impl<F> HandlerFn<F> {
    /// Make the handler terminable, running `g` on every termination.
    pub fn on_terminate<G>(mut self, g: G) -> Self
    where
        G: Fn(&Request, &Response) + Send + Sync + 'static,
    {
        self.on_terminate = Some(Box::new(g));
        self
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("terminable", &self.on_terminate.is_some())
            .finish()
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Request, RequestType) -> Result<Response, HandlerError> + Send + Sync,
{
    fn handle(
        &self,
        request: &Request,
        kind: RequestType,
        catch: bool,
    ) -> Result<Response, HandlerError> {
        match (self.f)(request, kind) {
            Ok(response) => Ok(response),
            Err(err) if catch => {
                tracing::debug!(error = %err, "Handler error converted to response");
                Ok(err.into_response())
            }
            Err(err) => Err(err),
        }
    }

    fn as_terminable(&self) -> Option<&dyn Terminable> {
        if self.on_terminate.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl<F> Terminable for HandlerFn<F>
where
    F: Send + Sync,
{
    fn terminate(&self, request: &Request, response: &Response) {
        if let Some(g) = &self.on_terminate {
            g(request, response);
        }
    }
}
