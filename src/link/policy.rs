//! Reconnect delay policy.
//!
//! The link retries forever. [`ReconnectPolicy`] only decides how long to wait
//! before each attempt: `first × factor^attempt`, clamped to `max`, then
//! jittered. The base is derived from the attempt number alone, so jitter
//! never feeds back into later delays.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use mqtt_station_esp32::link::{Jitter, ReconnectPolicy};
//!
//! let policy = ReconnectPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: Jitter::None,
//! };
//! assert_eq!(policy.delay(0), Duration::from_millis(100));
//! assert_eq!(policy.delay(1), Duration::from_millis(200));
//! assert_eq!(policy.delay(10), Duration::from_secs(1));
//!
//! assert_eq!(ReconnectPolicy::immediate().delay(42), Duration::ZERO);
//! ```

use rand_core::{OsRng, RngCore};
use std::time::Duration;

/// Randomisation applied to a computed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Exact delay.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// `delay/2` plus uniform in `[0, delay/2]`.
    Equal,
}

impl Jitter {
    /// Apply this jitter to `delay`.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis().min(u64::MAX as u128) as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        match self {
            Self::None => delay,
            Self::Full => Duration::from_millis(random_up_to(ms)),
            Self::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + random_up_to(half))
            }
        }
    }
}

/// Uniform-ish value in `[0, bound]` from the hardware RNG.
fn random_up_to(bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    OsRng.next_u64() % bound.saturating_add(1)
}

/// Delay schedule for link reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth per attempt.
    pub factor: f64,
    pub jitter: Jitter,
}

impl ReconnectPolicy {
    /// Reconnect as soon as the link drops, every time.
    pub fn immediate() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
            jitter: Jitter::None,
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };

        self.jitter.apply(base)
    }
}

impl Default for ReconnectPolicy {
    /// 500 ms doubling up to 30 s, with equal jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(500),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: Jitter::Equal,
        }
    }
}
