//! HTTP-facing values and transport bridge.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, trace/timeout/request-id layers)
//!     → service.rs (buffer body, build Request)
//!     → [dispatcher / handler]
//!     → Response → axum response
//!     → terminate (once per cycle)
//! ```

pub mod bags;
pub mod request;
pub mod request_id;
pub mod response;
pub mod server;
pub mod service;

pub use bags::{AttributeBag, FileBag, ParameterBag, ServerBag, UploadedFile};
pub use request::{Overrides, Request, RequestBuilder};
pub use request_id::X_REQUEST_ID;
pub use response::Response;
pub use server::HttpServer;
pub use service::KernelService;
