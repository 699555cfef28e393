use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use square_well::config::RunConfig;
use square_well::driver::{self, ProductionOptions};
use square_well::io::{default_filename, with_suffix, DataFiles};
use square_well::{build_strategy, Histograms, Simulation};

/// What a finished run leaves behind
pub struct RunOutcome {
    pub sim: Simulation,
    pub histograms: Histograms,
    pub method_tag: String,
    pub files: DataFiles,
}

/// Set up the simulation, initialize the weights and run production,
/// writing data files along the way
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    let mut sim = Simulation::new(&config.sim).wrap_err("Unable to set up the simulation")?;
    sim.debug = config.debug;
    info!(
        "Cell dimensions ({:.4}, {:.4}, {:.4}), filling fraction {:.4}",
        sim.cell.lengths.x,
        sim.cell.lengths.y,
        sim.cell.lengths.z,
        sim.filling_fraction()
    );

    let mut weights = build_strategy(
        &config.method,
        sim.energy_levels,
        config.initialization_iterations,
    );
    let method_tag = weights.tag();

    let filename = match &config.filename {
        Some(name) => {
            info!("Using given file name: {}", name);
            name.clone()
        }
        None => {
            let name = default_filename(
                sim.cell.walls,
                config.sim.well_width,
                sim.filling_fraction(),
                sim.n(),
                &method_tag,
            );
            info!("Using default file name: {}", name);
            name
        }
    };
    let filename = with_suffix(filename, config.suffix.as_deref());
    let files = DataFiles::new(&config.data_dir, filename, config.histograms)?;

    driver::initialize(&mut sim, weights.as_mut()).wrap_err("Initialization failed")?;
    files.write_weights(&sim, weights.as_ref())?;
    info!("Initialization done, starting {} production sweeps", config.iterations);

    let mut histograms = Histograms::new(&sim, &config.histograms)?;
    let options = ProductionOptions {
        iterations: config.iterations,
        report_interval: config.report_interval,
    };
    driver::production(
        &mut sim,
        weights.as_mut(),
        &mut histograms,
        &options,
        |sim, histograms| files.write_checkpoint(sim, histograms),
    )
    .wrap_err("Production run failed")?;

    Ok(RunOutcome {
        sim,
        histograms,
        method_tag,
        files,
    })
}
