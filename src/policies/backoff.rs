//! # Backoff policy between connection attempts.
//!
//! [`BackoffPolicy`] controls how the delay grows after repeated failed attempts.
//! It is parameterized by:
//! - [`BackoffPolicy::base`] the delay before the first retry;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::ceiling`] the maximum delay.
//!
//! The delay after the `k`-th consecutive failure (1-based) is
//! `min(base × factor^(k-1), ceiling)`, then jitter is applied. The base delay is
//! derived from the failure count alone, so jitter output never feeds back into
//! later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use gatevisor::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default(); // 2s, ×2, capped at 60s
//!
//! assert_eq!(backoff.delay_for(0), Duration::from_secs(2));
//! assert_eq!(backoff.delay_for(1), Duration::from_secs(4));
//! assert_eq!(backoff.delay_for(4), Duration::from_secs(32));
//! assert_eq!(backoff.delay_for(5), Duration::from_secs(60));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Exponential backoff with a ceiling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Maximum delay; also caps `base`.
    pub ceiling: Duration,
    /// Multiplicative growth factor (`2.0` doubles).
    pub factor: f64,
    /// Randomization applied to the capped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `base = 2s`, `factor = 2.0`, `ceiling = 60s`, no jitter.
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            ceiling: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Same policy with a different ceiling.
    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Same policy with a different base delay.
    pub fn with_base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// Same policy with a different jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay after `prior_failures + 1` consecutive failures.
    ///
    /// `delay_for(0)` is the first sleep. Overflowing or non-finite products clamp
    /// to the ceiling.
    pub fn delay_for(&self, prior_failures: u32) -> Duration {
        let ceiling = self.ceiling.as_secs_f64();
        let exp = i32::try_from(prior_failures).unwrap_or(i32::MAX);
        let raw = self.base.as_secs_f64() * self.factor.powi(exp);

        let capped = if !raw.is_finite() || raw < 0.0 || raw > ceiling {
            self.ceiling
        } else {
            Duration::from_secs_f64(raw)
        };
        self.jitter.apply(capped)
    }
}
