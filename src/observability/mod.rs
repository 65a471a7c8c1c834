//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and transport produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (dispatch/termination counters, table size)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace layer span
//! - Metrics are cheap and no-ops without an installed recorder

pub mod logging;
pub mod metrics;
