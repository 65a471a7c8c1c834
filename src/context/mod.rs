//! Current-request context for consumers that cannot receive the request.
//!
//! # Data Flow
//! ```text
//! UrlMap::handle (prefix matched)
//!     → derived request
//!     → RequestContext::set(RequestGlobals snapshot)
//!     → legacy consumers call RequestContext::current()
//! ```
//!
//! # Design Decisions
//! - The slot is injected into the dispatcher; without one nothing is recorded
//! - Overwritten on every matched dispatch, never torn down by the dispatcher
//! - `RequestContext::global()` is a compatibility escape hatch only: a single
//!   process-wide slot shared by every dispatcher that opts into it

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;

use crate::http::{ParameterBag, Request, ServerBag};

/// Snapshot of the request state legacy consumers read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestGlobals {
    pub server: ServerBag,
    pub query: ParameterBag,
    pub request: ParameterBag,
    pub cookies: ParameterBag,
}

impl RequestGlobals {
    pub fn from_request(request: &Request) -> Self {
        Self {
            server: request.server().clone(),
            query: request.query().clone(),
            request: request.form().clone(),
            cookies: request.cookies().clone(),
        }
    }
}

/// Shared slot holding the most recently dispatched request state.
#[derive(Debug, Default)]
pub struct RequestContext {
    current: ArcSwapOption<RequestGlobals>,
}

static GLOBAL: OnceLock<Arc<RequestContext>> = OnceLock::new();

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide context, for compatibility with consumers that read
    /// ambient state. Prefer injecting a dedicated context.
    pub fn global() -> Arc<RequestContext> {
        GLOBAL.get_or_init(|| Arc::new(RequestContext::new())).clone()
    }

    /// Replace the current snapshot with the state of `request`.
    pub fn set(&self, request: &Request) {
        self.current
            .store(Some(Arc::new(RequestGlobals::from_request(request))));
    }

    pub fn current(&self) -> Option<Arc<RequestGlobals>> {
        self.current.load_full()
    }

    pub fn clear(&self) {
        self.current.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::bags::keys;

    #[test]
    fn test_set_overwrites_snapshot() {
        let ctx = RequestContext::new();
        assert!(ctx.current().is_none());

        ctx.set(&Request::builder().uri("/a?x=1").build());
        ctx.set(&Request::builder().uri("/b").cookie("sid", "7").build());

        let current = ctx.current().unwrap();
        assert_eq!(current.server.get(keys::REQUEST_URI), Some("/b"));
        assert!(current.query.is_empty());
        assert_eq!(current.cookies.get("sid"), Some("7"));

        ctx.clear();
        assert!(ctx.current().is_none());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&RequestContext::global(), &RequestContext::global()));
    }
}
