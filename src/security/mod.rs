//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Every response:
//!     → headers.rs (CORS headers)
//! ```
//!
//! # Design Decisions
//! - The outbound payload is rebuilt from validated fields (see query/),
//!   so caller-supplied keys never reach the backend
//! - No authentication: the proxy is a validating gateway only

pub mod headers;

pub use headers::CorsHeaders;
