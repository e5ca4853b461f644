use crate::measure::BitRate;

/// Default signal propagation speed along the bus, in metres per second.
///
/// Two thirds of the speed of light, the usual figure for copper
/// coaxial cable.
///
/// ```
/// # use lansim_core::defaults::*;
/// assert_eq!(DEFAULT_PROPAGATION_SPEED, 2.0e8);
/// ```
pub const DEFAULT_PROPAGATION_SPEED: f64 = 2.0e8;

/// Default distance between two adjacent stations, in metres.
pub const DEFAULT_STATION_SPACING: f64 = 10.0;

/// Default bus bit rate.
///
/// ```
/// # use lansim_core::defaults::*;
/// assert_eq!(DEFAULT_BIT_RATE.to_string(), "1mbps");
/// ```
pub const DEFAULT_BIT_RATE: BitRate = BitRate::new(1_000_000);

/// Default frame length in bits.
///
/// Every packet occupies the bus for exactly
/// `DEFAULT_FRAME_LENGTH / bit_rate` seconds; frame sizes are fixed
/// for the whole run.
pub const DEFAULT_FRAME_LENGTH: u64 = 1_500;

/// Default retry ceiling for both backoff counters.
///
/// A station whose collision (or, in non-persistent mode, sensing)
/// retry counter would exceed this value drops the packet instead of
/// backing off again.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Length of one backoff slot, in bits.
///
/// Binary exponential backoff delays are whole multiples of the time
/// it takes to put this many bits on the bus (`512 / bit_rate`).
pub const BACKOFF_SLOT_BITS: u64 = 512;
