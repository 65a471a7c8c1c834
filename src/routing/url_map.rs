//! Prefix dispatcher.
//!
//! # Responsibilities
//! - Hold the fallback handler and the current prefix table
//! - Select the longest registered prefix of the decoded request path
//! - Rewrite the request so the sub-handler sees itself mounted at its root
//! - Fan termination out to every mounted handler, then the fallback
//!
//! # Design Decisions
//! - The table lives behind an `ArcSwap`: `handle` works on a snapshot and
//!   `set_map` swaps a fully sorted table in, never mutating in place
//! - Unmatched requests reach the fallback untouched (same reference)
//! - Handler errors and the `catch` flag pass through uninterpreted
//! - Termination notifies all mounts regardless of which one served

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::context::RequestContext;
use crate::http::bags::keys;
use crate::http::{Overrides, Request, Response};
use crate::kernel::{Handler, HandlerError, RequestType, Terminable};
use crate::observability::metrics;
use crate::routing::path::decode_path;
use crate::routing::table::PrefixTable;

/// Attribute carrying the mount root (`base_url + prefix`) a request was
/// dispatched under.
pub const ATTR_PREFIX: &str = "stack.url_map.prefix";

/// Routes requests to handlers mounted under path prefixes.
pub struct UrlMap {
    fallback: Arc<dyn Handler>,
    table: ArcSwap<PrefixTable>,
    context: Option<Arc<RequestContext>>,
}

impl UrlMap {
    /// Dispatcher with an empty table; everything reaches `fallback`.
    pub fn new(fallback: Arc<dyn Handler>) -> Self {
        Self {
            fallback,
            table: ArcSwap::from_pointee(PrefixTable::new()),
            context: None,
        }
    }

    /// Dispatcher with `mapping` mounted over `fallback`.
    pub fn with_map<I, K>(fallback: Arc<dyn Handler>, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, Arc<dyn Handler>)>,
        K: Into<String>,
    {
        let map = Self::new(fallback);
        map.set_map(mapping);
        map
    }

    pub fn builder(fallback: Arc<dyn Handler>) -> UrlMapBuilder {
        UrlMapBuilder {
            fallback,
            mounts: Vec::new(),
            context: None,
        }
    }

    /// Replace the whole prefix table.
    ///
    /// Dispatches already in flight finish against the table they started with.
    pub fn set_map<I, K>(&self, mapping: I)
    where
        I: IntoIterator<Item = (K, Arc<dyn Handler>)>,
        K: Into<String>,
    {
        let table = PrefixTable::from_mapping(mapping);
        tracing::trace!(prefixes = ?table.prefixes(), "Prefix table rebuilt");
        metrics::record_table_size(table.len());
        self.table.store(Arc::new(table));
    }

    /// Registered prefixes in matching order.
    pub fn prefixes(&self) -> Vec<String> {
        self.table.load().prefixes()
    }

    pub fn fallback(&self) -> &Arc<dyn Handler> {
        &self.fallback
    }
}

impl fmt::Debug for UrlMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlMap")
            .field("prefixes", &self.prefixes())
            .field("context", &self.context.is_some())
            .finish_non_exhaustive()
    }
}

impl Handler for UrlMap {
    fn handle(
        &self,
        request: &Request,
        kind: RequestType,
        catch: bool,
    ) -> Result<Response, HandlerError> {
        let table = self.table.load();
        let path_info = request.path_info();
        let decoded = decode_path(path_info);

        let Some(mount) = table.find(&decoded) else {
            tracing::debug!(path = %path_info, "No prefix matched, using fallback");
            metrics::record_dispatch(metrics::FALLBACK_MOUNT);
            return self.fallback.handle(request, kind, catch);
        };

        let mount_root = format!("{}{}", request.base_url(), mount.prefix());

        let mut server = request.server().clone();
        server.set(keys::SCRIPT_FILENAME, mount_root.as_str());
        server.set(keys::SCRIPT_NAME, mount_root.as_str());
        server.set(keys::SELF_PATH, mount_root.as_str());

        let mut attributes = request.attributes().clone();
        attributes.set(ATTR_PREFIX, mount_root.as_str());

        let mounted = request.duplicate(Overrides::new().server(server).attributes(attributes));

        if let Some(context) = &self.context {
            context.set(&mounted);
        }

        tracing::debug!(
            path = %path_info,
            prefix = %mount.prefix(),
            mount_root = %mount_root,
            "Dispatching to mounted handler"
        );
        metrics::record_dispatch(mount.prefix());

        mount.handler().handle(&mounted, kind, catch)
    }

    fn as_terminable(&self) -> Option<&dyn Terminable> {
        Some(self)
    }
}

impl Terminable for UrlMap {
    fn terminate(&self, request: &Request, response: &Response) {
        let table = self.table.load();
        for mount in table.iter() {
            if let Some(terminable) = mount.handler().as_terminable() {
                terminable.terminate(request, response);
            }
        }
        if let Some(terminable) = self.fallback.as_terminable() {
            terminable.terminate(request, response);
        }
        metrics::record_terminate();
    }
}

/// Incremental construction of a [`UrlMap`].
pub struct UrlMapBuilder {
    fallback: Arc<dyn Handler>,
    mounts: Vec<(String, Arc<dyn Handler>)>,
    context: Option<Arc<RequestContext>>,
}

impl UrlMapBuilder {
    /// Mount `handler` under `prefix`. Order only matters between
    /// equal-length prefixes.
    pub fn mount(mut self, prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.mounts.push((prefix.into(), handler));
        self
    }

    /// Record each matched dispatch in `context`.
    pub fn context(mut self, context: Arc<RequestContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn build(self) -> UrlMap {
        let mut map = UrlMap::with_map(self.fallback, self.mounts);
        map.context = self.context;
        map
    }
}

impl fmt::Debug for UrlMapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes: Vec<&str> = self.mounts.iter().map(|(p, _)| p.as_str()).collect();
        f.debug_struct("UrlMapBuilder")
            .field("mounts", &prefixes)
            .finish_non_exhaustive()
    }
}
