//! Retry and backoff policies.
//!
//! This module groups the knobs that control **whether** another connection
//! attempt is made and **how long** to wait before it.
//!
//! ## Contents
//! - [`RetryPolicy`]   how many attempts are allowed (`0` = unbounded)
//! - [`BackoffPolicy`] how the delay evolves (base / factor / ceiling + jitter)
//! - [`JitterPolicy`]  randomization of the delay
//!
//! ## Quick wiring
//! ```text
//! Config { retry: RetryPolicy, backoff: BackoffPolicy, .. }
//!      └─► core::supervisor uses:
//!           - retry.allows_another(attempt) to continue or give up
//!           - AttemptState::fail(&backoff) to pick the next sleep
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::unbounded()`
//! - `BackoffPolicy::default()` → base=2s, factor=2.0, ceiling=60s, jitter=None.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
