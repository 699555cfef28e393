//! Configuration management
//!
//! Every setting can come from a YAML file, from the command line, or from
//! the defaults below. The command line wins over the file.

mod args;

pub use args::Args;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SimError;
use crate::histograms::HistogramParams;
use crate::lattice::cell_lengths_for_filling_fraction;
use crate::simulation::SimParams;
use crate::weights::Method;

/// Main configuration structure
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemParams,
    #[serde(default)]
    pub simulation: SimulationParams,
    #[serde(default)]
    pub histograms: HistogramConfig,
    pub method: Option<Method>,
    #[serde(default)]
    pub output: OutputParams,
}

/// The fluid and its cell
#[derive(Debug, Deserialize, Serialize)]
pub struct SystemParams {
    pub n: Option<usize>,
    pub radius: Option<f64>,
    pub well_width: Option<f64>,
    pub filling_fraction: Option<f64>,
    /// Explicit cell lengths; the filling fraction is ignored when given
    pub lengths: Option<[f64; 3]>,
    pub walls: Option<usize>,
}

impl Default for SystemParams {
    fn default() -> Self {
        SystemParams {
            n: Some(1000),
            radius: Some(1.0),
            well_width: Some(1.3),
            filling_fraction: Some(0.3),
            lengths: None,
            walls: Some(0),
        }
    }
}

impl SystemParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.n.is_none() {
            self.n = defaults.n;
        }
        if self.radius.is_none() {
            self.radius = defaults.radius;
        }
        if self.well_width.is_none() {
            self.well_width = defaults.well_width;
        }
        if self.filling_fraction.is_none() {
            self.filling_fraction = defaults.filling_fraction;
        }
        if self.walls.is_none() {
            self.walls = defaults.walls;
        }
        self
    }
}

/// Monte Carlo run parameters
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationParams {
    pub iterations: Option<u64>,
    pub initialization_iterations: Option<u64>,
    pub seed: Option<u64>,
    pub neighbor_scale: Option<f64>,
    pub translation_scale: Option<f64>,
    pub dr: Option<f64>,
    pub acceptance_goal: Option<f64>,
    pub tune_period: Option<u64>,
    pub min_search_sweeps: Option<u64>,
    pub max_search_sweeps: Option<u64>,
    pub report_interval: Option<u64>,
    pub debug: Option<bool>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        let sim = SimParams::default();
        SimulationParams {
            iterations: Some(2_500_000),
            initialization_iterations: Some(500_000),
            seed: Some(sim.seed),
            neighbor_scale: Some(sim.neighbor_scale),
            translation_scale: Some(sim.translation_scale),
            dr: Some(sim.dr),
            acceptance_goal: Some(sim.acceptance_goal),
            tune_period: Some(sim.tune_period),
            min_search_sweeps: Some(sim.min_search_sweeps),
            max_search_sweeps: Some(sim.max_search_sweeps),
            report_interval: None,
            debug: Some(false),
        }
    }
}

impl SimulationParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.iterations.is_none() {
            self.iterations = defaults.iterations;
        }
        if self.initialization_iterations.is_none() {
            self.initialization_iterations = defaults.initialization_iterations;
        }
        if self.seed.is_none() {
            self.seed = defaults.seed;
        }
        if self.neighbor_scale.is_none() {
            self.neighbor_scale = defaults.neighbor_scale;
        }
        if self.translation_scale.is_none() {
            self.translation_scale = defaults.translation_scale;
        }
        if self.dr.is_none() {
            self.dr = defaults.dr;
        }
        if self.acceptance_goal.is_none() {
            self.acceptance_goal = defaults.acceptance_goal;
        }
        if self.tune_period.is_none() {
            self.tune_period = defaults.tune_period;
        }
        if self.min_search_sweeps.is_none() {
            self.min_search_sweeps = defaults.min_search_sweeps;
        }
        if self.max_search_sweeps.is_none() {
            self.max_search_sweeps = defaults.max_search_sweeps;
        }
        if self.debug.is_none() {
            self.debug = defaults.debug;
        }
        self
    }
}

/// Bin widths of the spatial histograms
#[derive(Debug, Deserialize, Serialize)]
pub struct HistogramConfig {
    pub de_g: Option<f64>,
    pub max_rdf_radius: Option<f64>,
    pub de_density: Option<f64>,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        let h = HistogramParams::default();
        HistogramConfig {
            de_g: Some(h.de_g),
            max_rdf_radius: Some(h.max_rdf_radius),
            de_density: Some(h.de_density),
        }
    }
}

impl HistogramConfig {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.de_g.is_none() {
            self.de_g = defaults.de_g;
        }
        if self.max_rdf_radius.is_none() {
            self.max_rdf_radius = defaults.max_rdf_radius;
        }
        if self.de_density.is_none() {
            self.de_density = defaults.de_density;
        }
        self
    }
}

/// Where the data files go
#[derive(Debug, Deserialize, Serialize)]
pub struct OutputParams {
    pub data_dir: Option<String>,
    pub filename: Option<String>,
    pub suffix: Option<String>,
}

impl Default for OutputParams {
    fn default() -> Self {
        OutputParams {
            data_dir: Some("papers/square-well-liquid/data".to_string()),
            filename: None,
            suffix: None,
        }
    }
}

impl OutputParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.data_dir.is_none() {
            self.data_dir = Self::default().data_dir;
        }
        self
    }
}

/// Everything a run needs, resolved from the file and the command line
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub sim: SimParams,
    pub method: Method,
    pub histograms: HistogramParams,
    pub iterations: u64,
    pub initialization_iterations: u64,
    pub report_interval: Option<u64>,
    pub debug: bool,
    pub data_dir: PathBuf,
    /// Explicit base name of the data files
    pub filename: Option<String>,
    pub suffix: Option<String>,
}

fn value<T>(cli: Option<T>, file: Option<T>, name: &'static str) -> Result<T, SimError> {
    cli.or(file)
        .ok_or_else(|| SimError::invalid(name, "no value given"))
}

impl Config {
    /// Parse a YAML configuration and fill in the defaults
    pub fn from_yaml(content: &str) -> Result<Self, SimError> {
        serde_yml::from_str::<Config>(content)
            .map(Config::with_defaults)
            .map_err(|e| SimError::invalid("config", e.to_string()))
    }

    /// Apply default values to any missing parameters
    pub fn with_defaults(self) -> Self {
        Config {
            system: self.system.with_defaults(),
            simulation: self.simulation.with_defaults(),
            histograms: self.histograms.with_defaults(),
            method: self.method,
            output: self.output.with_defaults(),
        }
    }

    /// Combine the file settings with the command line
    pub fn resolve(self, args: &Args) -> Result<RunConfig, SimError> {
        let method = select_method(args, self.method.as_ref())?;
        method.validate()?;

        let system = &self.system;
        let simulation = &self.simulation;
        let n = value(args.n, system.n, "N")?;
        let radius = value(args.radius, system.radius, "R")?;
        let lengths = match (&args.lengths, system.lengths) {
            (Some(l), _) => <[f64; 3]>::try_from(l.as_slice())
                .map_err(|_| SimError::invalid("lengths", "three cell lengths are needed"))?,
            (None, Some(l)) if args.ff.is_none() => l,
            _ => {
                let ff = value(args.ff, system.filling_fraction, "ff")?;
                if ff <= 0.0 {
                    return Err(SimError::invalid("ff", "filling fraction must be positive"));
                }
                cell_lengths_for_filling_fraction(n, radius, ff)
            }
        };

        let sim = SimParams {
            n,
            radius,
            well_width: value(args.ww, system.well_width, "ww")?,
            lengths,
            walls: value(args.walls, system.walls, "walls")?,
            neighbor_scale: value(args.neighbor_scale, simulation.neighbor_scale, "neighbor_scale")?,
            translation_scale: value(
                args.translation_scale,
                simulation.translation_scale,
                "translation_scale",
            )?,
            dr: value(args.dr, simulation.dr, "dr")?,
            acceptance_goal: value(args.acceptance_goal, simulation.acceptance_goal, "acceptance_goal")?,
            seed: value(args.seed, simulation.seed, "seed")?,
            tune_period: value(None, simulation.tune_period, "tune_period")?,
            min_search_sweeps: value(None, simulation.min_search_sweeps, "min_search_sweeps")?,
            max_search_sweeps: value(None, simulation.max_search_sweeps, "max_search_sweeps")?,
        };
        sim.validate()?;

        let histograms = HistogramParams {
            de_g: value(args.de_g, self.histograms.de_g, "de_g")?,
            max_rdf_radius: value(args.max_rdf_radius, self.histograms.max_rdf_radius, "max_rdf_radius")?,
            de_density: value(args.de_density, self.histograms.de_density, "de_density")?,
        };

        Ok(RunConfig {
            sim,
            method,
            histograms,
            iterations: value(args.iterations, simulation.iterations, "iterations")?,
            initialization_iterations: value(
                args.init_iters,
                simulation.initialization_iterations,
                "initialization_iterations",
            )?,
            report_interval: args.time.or(simulation.report_interval),
            debug: args.debug || simulation.debug.unwrap_or(false),
            data_dir: PathBuf::from(value(args.data_dir.clone(), self.output.data_dir, "data_dir")?),
            filename: args.filename.clone().or(self.output.filename),
            suffix: args.filename_suffix.clone().or(self.output.suffix),
        })
    }
}

/// Pick the histogram method. A selector on the command line wins over the
/// file; more than one selector on the command line, or none anywhere, is
/// an error. Method parameters given on the command line are applied on top.
pub fn select_method(args: &Args, file: Option<&Method>) -> Result<Method, SimError> {
    let selected = [
        args.nw,
        args.kt.is_some(),
        args.flat,
        args.gaussian,
        args.walkers,
        args.wang_landau,
    ]
    .iter()
    .filter(|&&on| on)
    .count();
    if selected > 1 {
        return Err(SimError::MethodSelection(selected));
    }

    let same_kind = |m: &Method| file.filter(|f| std::mem::discriminant(*f) == std::mem::discriminant(m)).cloned();
    let method = if args.nw {
        Method::NoWeights
    } else if let Some(kt) = args.kt {
        Method::Canonical { kt }
    } else if args.flat {
        same_kind(&Method::flat()).unwrap_or_else(Method::flat)
    } else if args.gaussian {
        same_kind(&Method::gaussian()).unwrap_or_else(Method::gaussian)
    } else if args.walkers {
        let walkers = Method::Walkers { first_update: None };
        same_kind(&walkers).unwrap_or(walkers)
    } else if args.wang_landau {
        same_kind(&Method::wang_landau()).unwrap_or_else(Method::wang_landau)
    } else {
        file.cloned().ok_or(SimError::MethodSelection(0))?
    };
    Ok(apply_method_overrides(method, args))
}

fn apply_method_overrides(method: Method, args: &Args) -> Method {
    match method {
        Method::Flat {
            cutoff,
            sample_sweeps,
            max_passes,
        } => Method::Flat {
            cutoff: args.gaussian_cutoff.unwrap_or(cutoff),
            sample_sweeps,
            max_passes,
        },
        Method::WangLandau {
            factor,
            fmod,
            threshold,
            cutoff,
            check_period,
        } => Method::WangLandau {
            factor: args.wl_factor.unwrap_or(factor),
            fmod: args.wl_fmod.unwrap_or(fmod),
            threshold: args.wl_threshold.unwrap_or(threshold),
            cutoff: args.wl_cutoff.unwrap_or(cutoff),
            check_period,
        },
        Method::Walkers { first_update } => Method::Walkers {
            first_update: args.first_update.or(first_update),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{filling_fraction, Cell};
    use crate::weights::{
        default_gaussian_cutoff, default_max_passes, default_sample_sweeps, default_wl_check_period,
        default_wl_cutoff, default_wl_factor, default_wl_fmod, default_wl_threshold,
    };
    use approx::assert_relative_eq;
    use clap::Parser;

    fn args(list: &[&str]) -> Args {
        Args::parse_from(std::iter::once("square-well-monte-carlo").chain(list.iter().copied()))
    }

    #[test]
    fn test_exactly_one_method() {
        let err = select_method(&args(&["--nw", "--walkers"]), None).unwrap_err();
        assert!(matches!(err, SimError::MethodSelection(2)));
        let err = select_method(&args(&[]), None).unwrap_err();
        assert!(matches!(err, SimError::MethodSelection(0)));
        assert_eq!(
            select_method(&args(&["--kT", "0.5"]), None).unwrap(),
            Method::Canonical { kt: 0.5 }
        );
    }

    #[test]
    fn test_command_line_method_wins_over_file() {
        let file = Method::Canonical { kt: 2.0 };
        assert_eq!(
            select_method(&args(&["--gaussian"]), Some(&file)).unwrap(),
            Method::gaussian()
        );
        assert_eq!(select_method(&args(&[]), Some(&file)).unwrap(), file);
    }

    #[test]
    fn test_method_parameters_from_file_and_command_line() {
        let config = Config::from_yaml("method:\n  type: wang_landau\n  factor: 0.5\n").unwrap();
        let method = select_method(&args(&["--wang-landau", "--wl-cutoff", "0.01"]), config.method.as_ref()).unwrap();
        assert_eq!(
            method,
            Method::WangLandau {
                factor: 0.5,
                fmod: default_wl_fmod(),
                threshold: default_wl_threshold(),
                cutoff: 0.01,
                check_period: default_wl_check_period(),
            }
        );
    }

    #[test]
    fn test_yaml_defaults() {
        let config = Config::from_yaml("system:\n  n: 64\n").unwrap();
        assert_eq!(config.system.n, Some(64));
        assert_eq!(config.system.well_width, Some(1.3));
        assert_eq!(config.simulation.iterations, Some(2_500_000));
        assert_eq!(config.histograms.de_g, Some(0.05));
        assert!(config.method.is_none());

        let config = Config::from_yaml("method:\n  type: flat\n").unwrap();
        assert_eq!(
            config.method,
            Some(Method::Flat {
                cutoff: default_gaussian_cutoff(),
                sample_sweeps: default_sample_sweeps(),
                max_passes: default_max_passes(),
            })
        );
        assert!(Config::from_yaml("method:\n  type: simulated_annealing\n").is_err());
    }

    #[test]
    fn test_resolve_sizes_cell_from_filling_fraction() {
        let config = Config::from_yaml(
            "system:\n  n: 100\n  well_width: 1.5\n  walls: 1\nmethod:\n  type: no_weights\n",
        )
        .unwrap();
        let run = config
            .resolve(&args(&["--ff", "0.2", "--seed", "9", "--iterations", "50"]))
            .unwrap();
        assert_eq!(run.sim.n, 100);
        assert_eq!(run.sim.walls, 1);
        assert_eq!(run.sim.seed, 9);
        assert_eq!(run.iterations, 50);
        assert_relative_eq!(run.sim.well_width, 1.5);
        let cell = Cell::new(run.sim.lengths, 1);
        assert_relative_eq!(filling_fraction(100, 1.0, &cell), 0.2, epsilon = 1e-12);
        assert_eq!(run.method, Method::NoWeights);
        assert_eq!(run.data_dir, PathBuf::from("papers/square-well-liquid/data"));
    }

    #[test]
    fn test_resolve_with_explicit_lengths() {
        let run = Config::default()
            .with_defaults()
            .resolve(&args(&["--nw", "--N", "4", "--lengths", "10", "10", "12"]))
            .unwrap();
        assert_eq!(run.sim.lengths, [10.0, 10.0, 12.0]);
        assert_eq!(default_wl_factor(), 0.125);
        assert_eq!(default_wl_cutoff(), 1e-6);
    }

    #[test]
    fn test_resolve_rejects_bad_systems() {
        let base = || Config::default().with_defaults();
        assert!(matches!(
            base().resolve(&args(&["--nw", "--walls", "4"])),
            Err(SimError::TooManyWalls(4))
        ));
        assert!(matches!(
            base().resolve(&args(&["--nw", "--ww", "0.5"])),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(matches!(
            base().resolve(&args(&["--nw", "--ff=-0.1"])),
            Err(SimError::InvalidParameter { name: "ff", .. })
        ));
        assert!(matches!(
            base().resolve(&args(&["--nw", "--N", "1000", "--lengths", "5", "5", "5"])),
            Err(SimError::Overfilled(_))
        ));
    }
}
