use lansim_core::{Access, BusGeometry, Simulation, SimulationConfig};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let geometry = BusGeometry::new()
        .set_bit_rate("1mbps".parse()?)
        .set_frame_length(1_500);

    // 20 stations, 7 packets per second each, 100 simulated seconds.
    for access in [Access::Persistent, Access::NonPersistent] {
        let config = SimulationConfig::new(20, 7.0)
            .set_access(access)
            .set_horizon(Duration::from_secs(100))
            .set_geometry(geometry);

        let mut simulation = Simulation::new(config)?;
        simulation.set_seed(42);
        let stats = simulation.run();

        println!("{access}: {stats}");
    }

    Ok(())
}
