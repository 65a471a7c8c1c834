//! Stack-style composition: wrap an inner handler as the fallback of a `UrlMap`.

use std::fmt;
use std::sync::Arc;

use tower::Layer;

use crate::kernel::Handler;
use crate::routing::url_map::UrlMap;

/// `tower::Layer` producing a [`UrlMap`] whose fallback is the wrapped handler.
#[derive(Clone, Default)]
pub struct UrlMapLayer {
    mounts: Vec<(String, Arc<dyn Handler>)>,
}

impl UrlMapLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(mut self, prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.mounts.push((prefix.into(), handler));
        self
    }
}

impl<H> Layer<H> for UrlMapLayer
where
    H: Handler + 'static,
{
    type Service = UrlMap;

    fn layer(&self, inner: H) -> UrlMap {
        UrlMap::with_map(Arc::new(inner), self.mounts.iter().cloned())
    }
}

impl fmt::Debug for UrlMapLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes: Vec<&str> = self.mounts.iter().map(|(p, _)| p.as_str()).collect();
        f.debug_struct("UrlMapLayer")
            .field("mounts", &prefixes)
            .finish()
    }
}
