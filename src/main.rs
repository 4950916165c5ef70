use std::error::Error;
use std::path::PathBuf;

use tether_sim::scenario;

// Headless runner: tether_sim [scenario.toml] [snapshot-out]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let scenario_path = PathBuf::from(args.next().unwrap_or_else(|| "init_config.toml".to_string()));
    let snapshot_path = args.next().map(PathBuf::from);

    let mut sim = scenario::load_scenario(&scenario_path)?;
    let steps = sim.config.steps;
    let dt_us = sim.config.dt_us;
    let report_interval = sim.config.report_interval.max(1);
    log::info!("Running {} steps of {:.3} s", steps, dt_us * 1e-6);

    let (mut formed, mut broken) = (0usize, 0usize);
    for _ in 0..steps {
        let report = sim.step(dt_us);
        formed += report.formed;
        broken += report.broken;
        if report.frame % report_interval == 0 {
            log::info!(
                "frame {:>6}  t = {:>9.1} s  active bonds {:>6}  formed {:>6}  broken {:>6}",
                report.frame,
                report.time_us * 1e-6,
                report.active,
                formed,
                broken
            );
            #[cfg(feature = "profiling")]
            tether_sim::PROFILER.lock().log_and_clear();
        }
    }

    let released = sim.release_all_bonds();
    log::info!(
        "Finished after {} frames: {} formed, {} broken, {} released at shutdown",
        sim.frame,
        formed,
        broken,
        released
    );
    for species in sim.species.iter() {
        log::info!("  {:<12} total {:.1}", species.name, sim.total_molecules(species.id));
    }

    if let Some(path) = snapshot_path {
        tether_sim::io::save_snapshot(&path, &sim)?;
    }
    Ok(())
}
