//! # Jitter applied on top of backoff delays.
//!
//! [`JitterPolicy`] spreads reconnects of many processes sharing one credential or
//! one egress IP so they do not hit the gateway in lockstep.
//!
//! - [`JitterPolicy::None`]: exact delay (default, deterministic)
//! - [`JitterPolicy::Full`]: uniform in `[0, delay]`
//! - [`JitterPolicy::Equal`]: `delay/2 + uniform[0, delay/2]`

use std::{str::FromStr, time::Duration};

use rand::Rng;

/// Randomization of a computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the delay as computed.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Half the delay plus uniform in `[0, delay/2]`.
    Equal,
}

impl JitterPolicy {
    /// Applies the policy to `delay`. The result never exceeds `delay`.
    pub fn apply(self, delay: Duration) -> Duration {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return delay;
        }
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let spread = ms - half;
                Duration::from_millis(half + rand::rng().random_range(0..=spread))
            }
        }
    }
}

impl FromStr for JitterPolicy {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(JitterPolicy::None),
            "full" => Ok(JitterPolicy::Full),
            "equal" => Ok(JitterPolicy::Equal),
            _ => Err("expected one of: none, full, equal"),
        }
    }
}
