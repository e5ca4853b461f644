use anyhow::{bail, ensure};
use logos::{Lexer, Logos};
use std::{fmt, str::FromStr, time::Duration};

/// The bit rate of the shared bus, in bits per second.
///
/// The bit rate fixes how long a station occupies the bus for one
/// frame and how long one backoff slot lasts. It is immutable for the
/// whole run.
///
/// # Example
///
/// ```
/// # use lansim_core::BitRate;
/// # use std::time::Duration;
/// let rate: BitRate = "1mbps".parse().unwrap();
/// // a 1500-bit frame takes 1.5ms on a 1mbps bus
/// assert_eq!(rate.time_to_send(1_500), Duration::from_micros(1_500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitRate(u64);

impl BitRate {
    /// create a new [`BitRate`] from a raw bits-per-second value.
    ///
    /// A zero bit rate is constructible but rejected when a
    /// [`SimulationConfig`] is validated.
    ///
    /// [`SimulationConfig`]: crate::SimulationConfig
    pub const fn new(bits_per_second: u64) -> Self {
        Self(bits_per_second)
    }

    /// Returns the raw bits-per-second value.
    #[inline]
    pub const fn bits_per_second(self) -> u64 {
        self.0
    }

    /// Returns how long it takes to put `bits` bits on the bus.
    ///
    /// ```
    /// # use lansim_core::BitRate;
    /// # use std::time::Duration;
    /// let rate = BitRate::new(1_000_000);
    /// assert_eq!(rate.time_to_send(512), Duration::from_micros(512));
    /// ```
    pub fn time_to_send(self, bits: u64) -> Duration {
        Duration::from_secs_f64(bits as f64 / self.0 as f64)
    }
}

impl Default for BitRate {
    fn default() -> Self {
        crate::defaults::DEFAULT_BIT_RATE
    }
}

// --- Display ---

const K: u64 = 1_000;
const M: u64 = 1_000_000;
const G: u64 = 1_000_000_000;

impl fmt::Display for BitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;

        if v < K || v % K != 0 {
            write!(f, "{v}bps")
        } else if v < M || v % M != 0 {
            write!(f, "{}kbps", v / K)
        } else if v < G || v % G != 0 {
            write!(f, "{}mbps", v / M)
        } else {
            write!(f, "{}gbps", v / G)
        }
    }
}

// --- FromStr ---

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum BitRateToken {
    #[regex("bps")]
    Bps,
    #[regex("kbps")]
    Kbps,
    #[regex("mbps")]
    Mbps,
    #[regex("gbps")]
    Gbps,

    #[regex("[0-9]+")]
    Value,
}

impl FromStr for BitRate {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, BitRateToken>::new(s);

        let Some(Ok(BitRateToken::Value)) = lex.next() else {
            bail!("Expecting to parse a number")
        };
        let number: u64 = lex.slice().parse()?;
        let Some(Ok(token)) = lex.next() else {
            bail!("Expecting to parse a unit")
        };
        let bps = match token {
            BitRateToken::Bps => number,
            BitRateToken::Kbps => number * K,
            BitRateToken::Mbps => number * M,
            BitRateToken::Gbps => number * G,
            BitRateToken::Value => bail!("Expecting to parse a unit (bps, kbps, ...)"),
        };

        ensure!(
            lex.next().is_none(),
            "Not expecting any other tokens to parse a bit rate"
        );

        Ok(Self::new(bps))
    }
}
