//! Client and per-call configuration.
//!
//! - [`CallOptions`]: per-call timeout, headers and priority
//! - [`RetryPolicy`]: retry behavior with exponential backoff

mod options;
mod retry;

pub use options::CallOptions;
pub use retry::{ExponentialBackoff, RetryPolicy, defaults, retry, retry_when, retry_with_policy};
