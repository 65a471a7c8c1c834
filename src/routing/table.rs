//! Prefix table: registered mounts ordered for longest-prefix-first matching.
//!
//! # Design Decisions
//! - Sorted once at build time by byte length, descending
//! - Stable sort: equal-length prefixes keep their registration order
//! - Immutable; a new mapping builds a new table

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::kernel::Handler;

/// A registered prefix and the handler mounted under it.
#[derive(Clone)]
pub struct Mount {
    prefix: String,
    handler: Arc<dyn Handler>,
}

impl Mount {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Mounts ordered by descending prefix length.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    mounts: Vec<Mount>,
}

impl PrefixTable {
    /// Empty table; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(prefix, handler)` pairs.
    ///
    /// A prefix given twice keeps its first position and its last handler.
    pub fn from_mapping<I, K>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, Arc<dyn Handler>)>,
        K: Into<String>,
    {
        let mut mounts: Vec<Mount> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (prefix, handler) in mapping {
            let prefix = prefix.into();
            match positions.get(&prefix) {
                Some(&at) => mounts[at].handler = handler,
                None => {
                    positions.insert(prefix.clone(), mounts.len());
                    mounts.push(Mount { prefix, handler });
                }
            }
        }
        mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { mounts }
    }

    /// First mount (in table order) whose prefix starts `decoded_path`.
    pub fn find(&self, decoded_path: &[u8]) -> Option<&Mount> {
        self.mounts
            .iter()
            .find(|m| decoded_path.starts_with(m.prefix.as_bytes()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.iter()
    }

    /// Prefixes in table order.
    pub fn prefixes(&self) -> Vec<String> {
        self.mounts.iter().map(|m| m.prefix.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::kernel::handler_fn;

    fn named(name: &'static str) -> Arc<dyn Handler> {
        Arc::new(handler_fn(move |_req, _kind| Ok(Response::text(name))))
    }

    fn served_by(mount: &Mount) -> String {
        let req = crate::http::Request::builder().build();
        let res = mount
            .handler()
            .handle(&req, crate::kernel::RequestType::Main, true)
            .unwrap();
        String::from_utf8(res.body().to_vec()).unwrap()
    }

    #[test]
    fn test_sorted_by_length_descending() {
        let table = PrefixTable::from_mapping([
            ("/a", named("a")),
            ("/api/v2", named("v2")),
            ("", named("root")),
            ("/api", named("api")),
        ]);
        assert_eq!(table.prefixes(), vec!["/api/v2", "/api", "/a", ""]);
    }

    #[test]
    fn test_equal_lengths_keep_registration_order() {
        let table = PrefixTable::from_mapping([
            ("/bb", named("b")),
            ("/aa", named("a")),
            ("/cc", named("c")),
            ("/long", named("l")),
        ]);
        assert_eq!(table.prefixes(), vec!["/long", "/bb", "/aa", "/cc"]);
    }

    #[test]
    fn test_repeated_prefix_keeps_position_takes_last_handler() {
        let table = PrefixTable::from_mapping([
            ("/x", named("first")),
            ("/y", named("y")),
            ("/x", named("second")),
        ]);
        assert_eq!(table.prefixes(), vec!["/x", "/y"]);
        assert_eq!(served_by(table.iter().next().unwrap()), "second");
    }

    #[test]
    fn test_many_repeated_prefixes_collapse_to_one_mount_each() {
        let mapping = (0..500).map(|i| {
            let prefix = format!("/p{}", i % 10);
            let handler = if i >= 490 { named("last") } else { named("early") };
            (prefix, handler)
        });
        let table = PrefixTable::from_mapping(mapping);
        assert_eq!(table.len(), 10);
        let expected: Vec<String> = (0..10).map(|i| format!("/p{i}")).collect();
        assert_eq!(table.prefixes(), expected);
        assert!(table.iter().all(|m| served_by(m) == "last"));
    }

    #[test]
    fn test_find_prefers_longest() {
        let table = PrefixTable::from_mapping([("/api", named("api")), ("/api/v2", named("v2"))]);
        assert_eq!(table.find(b"/api/v2/users").unwrap().prefix(), "/api/v2");
        assert_eq!(table.find(b"/api/v1").unwrap().prefix(), "/api");
        assert!(table.find(b"/shop").is_none());
    }

    #[test]
    fn test_literal_comparison() {
        let table = PrefixTable::from_mapping([("api", named("api")), ("/ap", named("ap"))]);
        // no implicit slash handling
        assert_eq!(table.find(b"/apix").unwrap().prefix(), "/ap");
        assert_eq!(table.find(b"api/x").unwrap().prefix(), "api");
        assert!(PrefixTable::new().find(b"/").is_none());
    }
}
