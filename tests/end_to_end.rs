use clap::Parser;
use square_well::config::{Args, Config};
use square_well::driver::{self, ProductionOptions};
use square_well::io::DataFiles;
use square_well::{build_strategy, HistogramParams, Histograms, Method, SimParams, Simulation};
use std::fs;

#[test]
fn test_four_balls_for_a_thousand_sweeps() {
    let params = SimParams {
        n: 4,
        lengths: [10.0, 10.0, 10.0],
        seed: 2024,
        ..SimParams::default()
    };
    let mut sim = Simulation::new(&params).unwrap();
    sim.debug = true;
    let mut weights = build_strategy(&Method::NoWeights, sim.energy_levels, 0);
    let mut histograms = Histograms::new(&sim, &HistogramParams::default()).unwrap();
    let options = ProductionOptions {
        iterations: 1000,
        report_interval: None,
    };
    driver::production(&mut sim, weights.as_mut(), &mut histograms, &options, |_, _| Ok(())).unwrap();

    assert_eq!(sim.moves.total, 4000);
    assert_eq!(sim.iteration, 1000);
    assert_eq!(histograms.total(), 1000);
    sim.verify_interactions().unwrap();
    sim.check_neighbor_symmetry().unwrap();
}

#[test]
fn test_walker_run_from_configuration() {
    let dir = std::env::temp_dir().join("square_well_end_to_end_walkers");
    let _ = fs::remove_dir_all(&dir);
    let yaml = format!(
        "system:\n  n: 8\n  filling_fraction: 0.2\n  walls: 1\n\
         simulation:\n  iterations: 100\n  initialization_iterations: 40\n  seed: 7\n  \
         tune_period: 10\n  min_search_sweeps: 20\n  max_search_sweeps: 200\n\
         method:\n  type: walkers\n  first_update: 5\n\
         output:\n  data_dir: {}\n  filename: walkers-test\n",
        dir.display()
    );
    let run = Config::from_yaml(&yaml)
        .unwrap()
        .resolve(&Args::parse_from(["square-well-monte-carlo"]))
        .unwrap();
    assert_eq!(run.method, Method::Walkers { first_update: Some(5) });

    let mut sim = Simulation::new(&run.sim).unwrap();
    let mut weights = build_strategy(&run.method, sim.energy_levels, run.initialization_iterations);
    let files = DataFiles::new(&run.data_dir, run.filename.clone().unwrap(), run.histograms).unwrap();

    driver::initialize(&mut sim, weights.as_mut()).unwrap();
    assert_eq!(sim.iteration, 0);
    assert_eq!(sim.moves.total, 0);
    files.write_weights(&sim, weights.as_ref()).unwrap();

    let mut histograms = Histograms::new(&sim, &run.histograms).unwrap();
    let options = ProductionOptions {
        iterations: run.iterations,
        report_interval: Some(50),
    };
    driver::production(&mut sim, weights.as_mut(), &mut histograms, &options, |sim, hist| {
        files.write_checkpoint(sim, hist)
    })
    .unwrap();

    assert_eq!(histograms.total(), 100);
    for kind in ["E", "lnw", "rt", "density"] {
        assert!(files.path(kind).exists(), "missing {} file", kind);
    }
    let energy = fs::read_to_string(files.path("E")).unwrap();
    assert!(energy.contains("# iterations: 100\n"));
    assert!(energy.contains("# total moves: 800\n"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_wang_landau_then_production() {
    let params = SimParams {
        n: 4,
        lengths: [8.0, 8.0, 8.0],
        seed: 99,
        tune_period: 10,
        min_search_sweeps: 20,
        max_search_sweeps: 200,
        ..SimParams::default()
    };
    let method = Method::WangLandau {
        factor: 0.125,
        fmod: 2.0,
        threshold: 3.0,
        cutoff: 0.01,
        check_period: 10,
    };
    let mut sim = Simulation::new(&params).unwrap();
    let mut weights = build_strategy(&method, sim.energy_levels, 0);
    driver::initialize(&mut sim, weights.as_mut()).unwrap();
    let frozen = weights.ln_weights().to_vec();

    let mut histograms = Histograms::new(&sim, &HistogramParams::default()).unwrap();
    let options = ProductionOptions {
        iterations: 200,
        report_interval: None,
    };
    driver::production(&mut sim, weights.as_mut(), &mut histograms, &options, |_, _| Ok(())).unwrap();
    assert_eq!(weights.ln_weights(), &frozen[..]);
    assert_eq!(histograms.total(), 200);
    sim.verify_interactions().unwrap();
}
