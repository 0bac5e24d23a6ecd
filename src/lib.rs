//! Time-range validating reverse proxy library.
//!
//! Accepts a `start_datetime`/`end_datetime` query on a single endpoint,
//! validates it, and forwards it to one fixed backend with a deadline that
//! grows with the width of the range.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod query;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::{ErrorKind, ProxyError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
