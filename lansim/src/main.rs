use anyhow::ensure;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lansim_core::{Access, BitRate, BusGeometry, RunStats, Simulation, SimulationConfig};
use std::time::Duration;

/// Sweeps the CSMA/CD simulation over a grid of station counts and
/// arrival rates and tabulates efficiency and throughput per
/// configuration.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Station counts to sweep
    #[arg(long, num_args = 1.., default_values_t = [20, 40, 60, 80, 100])]
    stations: Vec<usize>,

    /// Per-station packet arrival rates, in packets per second
    #[arg(long, num_args = 1.., default_values_t = [7.0, 10.0, 20.0])]
    rates: Vec<f64>,

    /// Carrier-sensing discipline(s) to run
    #[arg(long, value_enum, default_value_t = Mode::Both)]
    mode: Mode,

    /// Simulated horizon in seconds
    #[arg(long, default_value_t = 1_000.0)]
    horizon_secs: f64,

    /// Seed for every run's random-number generator
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Bus bit rate (e.g. "1mbps")
    #[arg(long, default_value = "1mbps")]
    bit_rate: BitRate,

    /// Frame length in bits
    #[arg(long, default_value_t = 1_500)]
    frame_length: u64,

    /// Distance between adjacent stations in metres
    #[arg(long, default_value_t = 10.0)]
    spacing: f64,

    /// Retry ceiling before a packet is dropped
    #[arg(long, default_value_t = lansim_core::defaults::DEFAULT_MAX_RETRIES)]
    max_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Persistent,
    NonPersistent,
    Both,
}

impl Mode {
    fn accesses(self) -> Vec<Access> {
        match self {
            Mode::Persistent => vec![Access::Persistent],
            Mode::NonPersistent => vec![Access::NonPersistent],
            Mode::Both => vec![Access::Persistent, Access::NonPersistent],
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    ensure!(
        args.horizon_secs > 0.0 && args.horizon_secs.is_finite(),
        "the horizon must be a positive number of seconds"
    );

    let geometry = BusGeometry::new()
        .set_bit_rate(args.bit_rate)
        .set_frame_length(args.frame_length)
        .set_station_spacing(args.spacing);
    let horizon = Duration::from_secs_f64(args.horizon_secs);
    let modes = args.mode.accesses();

    let total = modes.len() * args.rates.len() * args.stations.len();
    let progress = ProgressBar::new(total as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);

    let mut rows: Vec<(Access, usize, f64, RunStats)> = Vec::with_capacity(total);
    for &access in &modes {
        for &rate in &args.rates {
            for &stations in &args.stations {
                progress.set_message(format!("{access} N={stations} rate={rate}"));

                let config = SimulationConfig::new(stations, rate)
                    .set_access(access)
                    .set_horizon(horizon)
                    .set_max_retries(args.max_retries)
                    .set_geometry(geometry);
                let mut simulation = Simulation::new(config)?;
                simulation.set_seed(args.seed);

                rows.push((access, stations, rate, simulation.run()));
                progress.inc(1);
            }
        }
    }
    progress.finish_and_clear();

    println!(
        "{:<15} {:>5} {:>7} {:>10} {:>10} {:>9} {:>11} {:>11}",
        "mode", "N", "rate", "attempts", "sent", "dropped", "efficiency", "mbps"
    );
    for (access, stations, rate, stats) in rows {
        println!(
            "{:<15} {:>5} {:>7.1} {:>10} {:>10} {:>9} {:>11.4} {:>11.4}",
            access.to_string(),
            stations,
            rate,
            stats.transmit_attempts,
            stats.sent_packets,
            stats.dropped_packets,
            stats.efficiency(),
            stats.throughput() / 1e6,
        );
    }

    Ok(())
}
