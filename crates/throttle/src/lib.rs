//! # biblio Throttle
//!
//! Request throttling and an in-memory log of API requests.

mod rate_limiter;
mod request_log;

pub use rate_limiter::RateLimiter;
pub use request_log::{RequestEntry, RequestEventType, RequestLog, RequestStats};
