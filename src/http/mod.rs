//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, method dispatch, middleware)
//!     → request.rs (request ID, GET/POST payload → RawQuery)
//!     → [query validation + timeout tier]
//!     → client.rs (single POST to the backend)
//!     → response.rs (backend reply → JSON object)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{BackendClient, BackendResponse};
pub use request::{InboundPayload, RequestId, RequestIdExt, X_REQUEST_ID};
pub use response::NormalizedResponse;
pub use server::HttpServer;
