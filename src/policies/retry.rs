//! # Retry limit for connection attempts.
//!
//! [`RetryPolicy`] decides whether another attempt may follow a retryable failure.
//! A limit of `0` means "retry forever", matching the `GATEWAY_CONNECT_RETRIES`
//! convention.
//!
//! ```text
//! attempt fails (retryable)
//!   ├─ limit None            → back off, try again
//!   ├─ attempt <  limit      → back off, try again
//!   └─ attempt >= limit      → RetriesExhausted (no sleep)
//! ```

/// How many attempts the supervisor may make.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Retries forever.
    pub const fn unbounded() -> Self {
        Self { max_attempts: 0 }
    }

    /// At most `max_attempts` attempts; `0` is treated as unbounded.
    pub const fn limited(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// One attempt; the first retryable failure is propagated.
    pub const fn one_shot() -> Self {
        Self::limited(1)
    }

    /// Returns the limit as an `Option` (`None` = unbounded).
    #[inline]
    pub fn limit(&self) -> Option<u32> {
        if self.max_attempts == 0 {
            None
        } else {
            Some(self.max_attempts)
        }
    }

    /// True if another attempt may follow the failed attempt number `attempt`.
    pub fn allows_another(&self, attempt: u32) -> bool {
        self.limit().is_none_or(|max| attempt < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_unbounded() {
        let policy = RetryPolicy::limited(0);
        assert_eq!(policy, RetryPolicy::unbounded());
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(u32::MAX));
    }

    #[test]
    fn limit_counts_attempts_not_retries() {
        let policy = RetryPolicy::limited(3);
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
        assert!(!policy.allows_another(4));
    }

    #[test]
    fn one_shot_never_retries() {
        assert!(!RetryPolicy::one_shot().allows_another(1));
    }
}
