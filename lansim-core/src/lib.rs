/*!
# lansim-core

Discrete-event simulation of CSMA/CD contention on a shared broadcast
bus. `N` stations sit at fixed intervals along the bus, each generating
Poisson packet arrivals. The simulation replays the contention protocol
event by event: the station with the earliest pending attempt
transmits, every other station's next attempt is classified against
that transmission (collision, busy deferral, or unaffected given the
finite propagation delay), and the affected stations back off with
binary exponential backoff until a retry ceiling drops the packet.

Both sensing disciplines are supported: 1-persistent (a deferred
station retries the instant the bus frees) and non-persistent (a
deferred station backs off a random interval before re-sensing).

The whole run is synchronous and deterministic: all randomness flows
through one seedable [`ChaChaRng`](rand_chacha::ChaChaRng) owned by the
[`Simulation`], so the same seed and configuration always produce the
same [`RunStats`].

```
use lansim_core::{BusGeometry, run_simulation};
use std::time::Duration;

let (efficiency, throughput) = run_simulation(
    2,                        // stations
    5.0,                      // packets per second, per station
    true,                     // 1-persistent sensing
    Duration::from_secs(20),  // simulated horizon
    BusGeometry::new(),
)?;
assert!(efficiency > 0.0 && efficiency <= 1.0);
assert!(throughput >= 0.0);
# Ok::<(), lansim_core::ConfigError>(())
```
*/

mod backoff;
pub mod defaults;
mod geometry;
mod measure;
mod simulation;
mod station;
mod stats;
mod variate;

pub use self::{
    geometry::{BusGeometry, Sense},
    measure::BitRate,
    simulation::{Access, ConfigError, Simulation, SimulationConfig, run_simulation},
    station::{StationId, Timeline},
    stats::RunStats,
};
