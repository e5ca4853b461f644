//! Run statistics.
//!
//! [`RunStats`] is the final snapshot of a completed run. Obtain one
//! from [`Simulation::run`](crate::Simulation::run).

use std::{fmt, time::Duration};

/// Counters accumulated over one simulation run, finalized when the
/// clock passes the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Transmission attempts, including every collided retransmission.
    pub transmit_attempts: u64,
    /// Packets that made it onto the bus without a collision.
    pub sent_packets: u64,
    /// Packets dropped after exhausting a retry ceiling.
    pub dropped_packets: u64,
    /// Packets generated by the arrival processes before the horizon.
    pub generated_packets: u64,
    /// The simulated horizon the run was configured with.
    pub horizon: Duration,
    /// The fixed frame length in bits.
    pub frame_length: u64,
}

impl RunStats {
    /// Ratio of successfully sent packets to transmission attempts.
    ///
    /// In `(0, 1]` for any run with at least one success; `0` when
    /// nothing was ever attempted.
    pub fn efficiency(&self) -> f64 {
        if self.transmit_attempts == 0 {
            0.0
        } else {
            self.sent_packets as f64 / self.transmit_attempts as f64
        }
    }

    /// Successfully delivered bits per second of simulated time.
    pub fn throughput(&self) -> f64 {
        (self.sent_packets * self.frame_length) as f64 / self.horizon.as_secs_f64()
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempts: {attempts}, sent: {sent}, dropped: {dropped}, efficiency: {efficiency:.4}, throughput: {throughput:.0}bps",
            attempts = self.transmit_attempts,
            sent = self.sent_packets,
            dropped = self.dropped_packets,
            efficiency = self.efficiency(),
            throughput = self.throughput(),
        )
    }
}
