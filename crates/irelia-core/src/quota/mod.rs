//! Admission control for calls to the remote API.
//!
//! - [`RateLimiter`]: sliding-window counter for one limit
//! - [`QuotaGate`]: all limits at once, check-and-record under one lock

mod gate;
mod limiter;

pub use gate::{Admission, LimiterUsage, QuotaGate};
pub use limiter::RateLimiter;
