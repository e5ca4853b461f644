use crate::{
    defaults::{
        BACKOFF_SLOT_BITS, DEFAULT_FRAME_LENGTH, DEFAULT_PROPAGATION_SPEED,
        DEFAULT_STATION_SPACING,
    },
    measure::BitRate,
    station::StationId,
};
use std::time::Duration;

/// How another station's next attempt relates to an in-flight
/// transmission.
///
/// Classified once, at the sender's transmission-start time; the
/// category is a pure function of `(start, hops, other_head)` and is
/// never re-evaluated as the step progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// The other station starts before the sender's signal reaches it:
    /// it cannot have sensed the bus busy, so the frames collide.
    /// Boundary ties count as collisions — arriving exactly when the
    /// signal does is unsafe.
    Colliding,
    /// The other station would start while the bus is physically busy
    /// from its own vantage point: it senses the carrier and defers.
    /// The upper boundary is inclusive too.
    Deferred,
    /// The other station starts after the transmission has cleared its
    /// position on the bus; it is unaffected this round.
    Irrelevant,
}

/// The fixed physical parameters of the bus, and the delays derived
/// from them.
///
/// Stations sit at regular intervals along a straight cable, so the
/// propagation delay between two stations is proportional to the
/// difference of their indices. All parameters are immutable for a
/// run.
///
/// # Example
///
/// ```
/// # use lansim_core::BusGeometry;
/// # use std::time::Duration;
/// let bus = BusGeometry::new()
///     .set_bit_rate("1mbps".parse().unwrap())
///     .set_frame_length(1_500);
///
/// assert_eq!(bus.transmission_time(), Duration::from_micros(1_500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusGeometry {
    propagation_speed: f64,
    station_spacing: f64,
    bit_rate: BitRate,
    frame_length: u64,
}

impl Default for BusGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl BusGeometry {
    /// create a [`BusGeometry`] with the default lab constants: a
    /// 10 m station spacing, signals at two thirds of the speed of
    /// light, a 1mbps bus and 1500-bit frames.
    pub const fn new() -> Self {
        Self {
            propagation_speed: DEFAULT_PROPAGATION_SPEED,
            station_spacing: DEFAULT_STATION_SPACING,
            bit_rate: crate::defaults::DEFAULT_BIT_RATE,
            frame_length: DEFAULT_FRAME_LENGTH,
        }
    }

    /// Set the signal propagation speed in metres per second.
    pub const fn set_propagation_speed(mut self, metres_per_second: f64) -> Self {
        self.propagation_speed = metres_per_second;
        self
    }

    /// Set the distance between two adjacent stations in metres.
    pub const fn set_station_spacing(mut self, metres: f64) -> Self {
        self.station_spacing = metres;
        self
    }

    /// Set the bus bit rate.
    pub const fn set_bit_rate(mut self, bit_rate: BitRate) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    /// Set the fixed frame length in bits.
    pub const fn set_frame_length(mut self, bits: u64) -> Self {
        self.frame_length = bits;
        self
    }

    #[inline]
    pub fn propagation_speed(&self) -> f64 {
        self.propagation_speed
    }

    #[inline]
    pub fn station_spacing(&self) -> f64 {
        self.station_spacing
    }

    #[inline]
    pub fn bit_rate(&self) -> BitRate {
        self.bit_rate
    }

    #[inline]
    pub fn frame_length(&self) -> u64 {
        self.frame_length
    }

    /// Time for a signal to travel between two stations.
    ///
    /// Symmetric, and zero for a station and itself.
    pub fn propagation_delay(&self, a: StationId, b: StationId) -> Duration {
        let distance = a.hops(b) as f64 * self.station_spacing;
        Duration::from_secs_f64(distance / self.propagation_speed)
    }

    /// Duration a station occupies the bus sending one frame.
    pub fn transmission_time(&self) -> Duration {
        self.bit_rate.time_to_send(self.frame_length)
    }

    /// Duration of one binary-exponential-backoff slot (512 bit times).
    pub fn slot_time(&self) -> Duration {
        self.bit_rate.time_to_send(BACKOFF_SLOT_BITS)
    }

    /// Classifies `other`'s next attempt against a transmission that
    /// `sender` starts at `start`.
    ///
    /// With `prop` the propagation delay between the two stations and
    /// `trans` the transmission time:
    ///
    /// - [`Sense::Colliding`] when `other_head <= start + prop`,
    /// - [`Sense::Deferred`] when
    ///   `start + prop < other_head <= start + prop + trans`,
    /// - [`Sense::Irrelevant`] otherwise.
    ///
    /// Both bounds are non-strict: a tie at either boundary is treated
    /// as unsafe (collision, resp. busy).
    pub fn classify(
        &self,
        sender: StationId,
        start: Duration,
        other: StationId,
        other_head: Duration,
    ) -> Sense {
        let sensed_at = start + self.propagation_delay(sender, other);

        if other_head <= sensed_at {
            Sense::Colliding
        } else if other_head <= sensed_at + self.transmission_time() {
            Sense::Deferred
        } else {
            Sense::Irrelevant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u64) -> StationId {
        StationId::from(index as usize)
    }

    #[test]
    fn default_lab_delays() {
        let bus = BusGeometry::new();

        // 10m at 2e8 m/s
        assert_eq!(bus.propagation_delay(id(0), id(1)), Duration::from_nanos(50));
        // 1500 bits at 1mbps
        assert_eq!(bus.transmission_time(), Duration::from_micros(1_500));
        // 512 bits at 1mbps
        assert_eq!(bus.slot_time(), Duration::from_micros(512));
    }

    #[test]
    fn propagation_delay_is_symmetric_and_zero_for_self() {
        let bus = BusGeometry::new();

        assert_eq!(
            bus.propagation_delay(id(2), id(9)),
            bus.propagation_delay(id(9), id(2)),
        );
        assert_eq!(bus.propagation_delay(id(4), id(4)), Duration::ZERO);
    }

    #[test]
    fn propagation_delay_scales_with_hops() {
        let bus = BusGeometry::new();

        assert_eq!(
            bus.propagation_delay(id(0), id(10)),
            Duration::from_nanos(500),
        );
    }

    #[test]
    fn classify_boundaries_are_non_strict() {
        let bus = BusGeometry::new();
        let start = Duration::from_millis(2);
        let prop = bus.propagation_delay(id(0), id(1));
        let trans = bus.transmission_time();

        // adjacent stations, other head exactly one propagation delay
        // after the start: still a collision
        assert_eq!(
            bus.classify(id(0), start, id(1), start + prop),
            Sense::Colliding,
        );
        // one nanosecond later the signal has arrived: busy bus
        assert_eq!(
            bus.classify(id(0), start, id(1), start + prop + Duration::from_nanos(1)),
            Sense::Deferred,
        );
        // exactly at the end of the busy window: still busy
        assert_eq!(
            bus.classify(id(0), start, id(1), start + prop + trans),
            Sense::Deferred,
        );
        // past the window: unaffected
        assert_eq!(
            bus.classify(
                id(0),
                start,
                id(1),
                start + prop + trans + Duration::from_nanos(1)
            ),
            Sense::Irrelevant,
        );
    }

    #[test]
    fn classify_is_idempotent() {
        let bus = BusGeometry::new();
        let start = Duration::from_millis(1);
        let head = Duration::from_micros(1_100);

        let first = bus.classify(id(3), start, id(7), head);
        for _ in 0..10 {
            assert_eq!(bus.classify(id(3), start, id(7), head), first);
        }
    }

    #[test]
    fn simultaneous_start_collides() {
        let bus = BusGeometry::new();
        let start = Duration::ZERO;

        assert_eq!(bus.classify(id(0), start, id(1), start), Sense::Colliding);
    }
}
