//! Random variate generation.
//!
//! Every draw consumes randomness from a caller-provided [`Rng`], so a
//! simulation seeded through its central generator replays the exact
//! same variate sequence.

use rand_core::Rng;
use std::time::Duration;

/// A uniform sample in `[0, 1)` derived from one `next_u64` draw.
fn uniform01<R: Rng>(rng: &mut R) -> f64 {
    let bits = rng.next_u64();
    (bits as f64) * (1.0 / (u64::MAX as f64 + 1.0))
}

/// Draws an exponentially distributed duration with the given rate
/// parameter (inverse transform: `-(1/rate) * ln(1 - u)`).
///
/// `rate` must be positive and finite; configurations are validated
/// before any draw happens.
pub(crate) fn exponential<R: Rng>(rng: &mut R, rate: f64) -> Duration {
    debug_assert!(rate > 0.0 && rate.is_finite());

    let u = uniform01(rng);
    Duration::from_secs_f64(-(1.0 - u).ln() / rate)
}

/// Draws a backoff slot count, uniform over the integers
/// `1 ..= 2^k - 1`.
///
/// `k` is the retry counter, at least 1 when this is called; for
/// `k = 1` the only possible value is 1. The exponent is capped at 16,
/// which keeps the span well within range for any retry ceiling.
pub(crate) fn backoff_slots<R: Rng>(rng: &mut R, k: u32) -> u32 {
    debug_assert!(k >= 1);

    let span = (1u64 << k.min(16)) - 1;
    let slot = 1 + (uniform01(rng) * span as f64) as u64;
    slot.min(span) as u32
}
