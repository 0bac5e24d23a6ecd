//! Time-range query subsystem.
//!
//! # Data Flow
//! ```text
//! GET query string / POST JSON body
//!     → http/request.rs (transport → RawQuery)
//!     → validator.rs (presence, integer type, ordering)
//!     → TimeRangeQuery (immutable, start <= end)
//!     → forwarded field by field to the backend
//! ```

pub mod types;
pub mod validator;

pub use types::{RawQuery, TimeRangeQuery, END_KEY, START_KEY};
pub use validator::validate;
