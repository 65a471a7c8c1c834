//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Ctrl+C or Shutdown::trigger
//!     → shutdown_signal resolves
//!     → server stops accepting, drains in-flight requests
//! ```

pub mod shutdown;

pub use shutdown::{shutdown_signal, Shutdown};
