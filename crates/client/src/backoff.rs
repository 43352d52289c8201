//! Exponential backoff for retried generation requests.
//!
//! The delay before retry `n` (1-based) is `base * 2^(n-1)`: with the
//! default 1 s base that is 1 s, 2 s, 4 s. Jitter is off unless a
//! positive ratio is configured.

use std::time::Duration;

use rand::Rng;

/// Delay before retry number `retry` (1-based). `retry == 0` yields zero.
pub fn retry_delay(base: Duration, retry: u32) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }
    let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// Add up to `ratio * delay` of random jitter. Ratios `<= 0` return `delay`
/// unchanged.
pub fn with_jitter(delay: Duration, ratio: f64) -> Duration {
    if ratio <= 0.0 || delay.is_zero() {
        return delay;
    }
    let max_extra_ms = (delay.as_millis() as f64 * ratio.min(1.0)) as u64;
    if max_extra_ms == 0 {
        return delay;
    }
    let extra = rand::rng().random_range(0..=max_extra_ms);
    delay + Duration::from_millis(extra)
}
