//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Validated query:
//!     → timeouts.rs (span → tier → deadline)
//!     → forwarding client wraps the backend call in that deadline
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - No retries: a failed forward is reported once

pub mod timeouts;

pub use timeouts::{TimeoutPolicy, TimeoutTier};
