//! Resilience layer.
//!
//! Provides the retry policy and per-language rate limiting used by the
//! request executor.

mod rate_limit;
mod retry;

pub use rate_limit::{RateLimitConfig, RateLimitTable, RateLimiter};
pub use retry::{AttemptFailure, RetryConfig, RetryPolicy};
