//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults / embedder-provided values / CLI flags
//!     → schema.rs (typed, serde, all fields defaulted)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - No file loading here; the embedding process owns its config sources
//! - Mount tables are code, not config: handlers cannot be deserialized
//! - Validation separates syntactic (serde) from semantic checks

pub mod schema;
pub mod validation;

pub use schema::{AppConfig, DispatchConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
