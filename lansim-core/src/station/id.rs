use anyhow::anyhow;
use std::{fmt, str};

/// The identifier of a station on the shared bus.
///
/// Stations are numbered `0..N-1` from one end of the bus to the
/// other; the physical distance between two stations is proportional
/// to the difference of their identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct StationId(u64);

impl StationId {
    pub const ZERO: Self = StationId::new(0);

    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Number of station-to-station hops between `self` and `other`.
    pub(crate) const fn hops(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl From<usize> for StationId {
    fn from(index: usize) -> Self {
        Self::new(index as u64)
    }
}

impl str::FromStr for StationId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self).map_err(|error| anyhow!("{error}"))
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
