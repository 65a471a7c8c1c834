//! Prefix-mounting request dispatcher.
//!
//! A [`UrlMap`] routes each request to the handler mounted under the longest
//! matching path prefix and rewrites the request so that handler sees itself
//! mounted at its own root. Unmatched requests reach a fallback handler.
//!
//! ```text
//!   request ──▶ UrlMap ──(longest prefix)──▶ mounted handler
//!                  │
//!                  └──(no match)──▶ fallback handler
//! ```

pub mod config;
pub mod context;
pub mod http;
pub mod kernel;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use context::{RequestContext, RequestGlobals};
pub use http::{HttpServer, KernelService, Request, Response};
pub use kernel::{handler_fn, Handler, HandlerError, RequestType, Terminable};
pub use lifecycle::Shutdown;
pub use routing::{UrlMap, UrlMapLayer, ATTR_PREFIX};
