use crate::variate;
use rand_core::Rng;
use std::time::Duration;

/// What a station does with its head packet after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Retry after the given backoff delay.
    Reschedule(Duration),
    /// The retry ceiling was exceeded: the packet is dropped and the
    /// station's counters reset.
    Drop,
}

/// Binary exponential backoff policy, shared by the collision and the
/// busy-sensing retry paths.
///
/// Per counter, the state machine is
/// `Idle(0) → Backoff(1) → … → Backoff(max_retries) → Drop`:
/// the `k`-th failure reschedules after a uniform draw of
/// `1 ..= 2^k - 1` slots while `k <= max_retries`, and forces the drop
/// transition beyond that. The counters themselves live on each
/// [`Station`](crate::station::Station); this policy is stateless.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    max_retries: u32,
    slot_time: Duration,
}

impl Backoff {
    pub(crate) fn new(max_retries: u32, slot_time: Duration) -> Self {
        Self {
            max_retries,
            slot_time,
        }
    }

    /// Decides the fate of a head packet that just failed its
    /// `retries`-th attempt (the caller has already incremented the
    /// relevant counter).
    pub(crate) fn decide<R: Rng>(&self, retries: u32, rng: &mut R) -> Decision {
        if retries <= self.max_retries {
            let slots = variate::backoff_slots(rng, retries);
            Decision::Reschedule(self.slot_time * slots)
        } else {
            Decision::Drop
        }
    }
}
