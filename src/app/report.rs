use tracing::info;

use square_well::config::RunConfig;
use square_well::driver::log_progress;

use super::runner::RunOutcome;

pub fn report_configuration(config: &RunConfig) {
    let sim = &config.sim;
    info!("Configuration:");
    info!("  N: {}, R: {}, well_width: {}", sim.n, sim.radius, sim.well_width);
    info!(
        "  cell: ({:.4}, {:.4}, {:.4}) with {} walls",
        sim.lengths[0], sim.lengths[1], sim.lengths[2], sim.walls
    );
    info!("  method: {:?}", config.method);
    info!(
        "  iterations: {}, initialization iterations: {}, seed: {}",
        config.iterations, config.initialization_iterations, sim.seed
    );
    if config.debug {
        info!("  debug checks after every sweep are on");
    }
}

pub fn report_summary(outcome: &RunOutcome) {
    let sim = &outcome.sim;
    info!("\nRun with {} weights finished.", outcome.method_tag);
    log_progress(sim);
    info!(
        "Max entropy state {}, most interactions observed {}",
        sim.state_of_max_entropy, sim.max_observed_interactions
    );
    let round_trips: u64 = sim.levels.round_trips.iter().copied().max().unwrap_or(0);
    info!("Most round trips through any energy level: {}", round_trips);
    info!(
        "Recorded {} sweeps; data written to {}",
        outcome.histograms.total(),
        outcome.files.dir().display()
    );
}
