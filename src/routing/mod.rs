//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (base URL, raw path info)
//!     → path.rs (percent-decode for comparison)
//!     → table.rs (first prefix, longest first)
//!     → url_map.rs (rewrite mount metadata, delegate)
//!     → mounted handler, or fallback on no match
//!
//! Table construction (set_map):
//!     (prefix, handler) pairs
//!     → stable sort by prefix length, descending
//!     → atomic swap into the dispatcher
//! ```
//!
//! # Design Decisions
//! - Prefixes compare literally against decoded bytes (no segment semantics)
//! - First match in table order wins, so the longest prefix wins
//! - Tables are immutable; replacement is whole-table

pub mod layer;
pub mod path;
pub mod table;
pub mod url_map;

pub use layer::UrlMapLayer;
pub use table::{Mount, PrefixTable};
pub use url_map::{UrlMap, UrlMapBuilder, ATTR_PREFIX};
