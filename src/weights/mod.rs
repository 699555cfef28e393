//! Energy weights that bias the Metropolis acceptance of the move engine.
//!
//! Each method owns a table of natural-log weights, one per energy level. A
//! trial move from level `old` to level `new` is accepted with probability
//! `min(1, w(new)/w(old))`. Adaptive methods revise their table from the
//! visitation statistics the engine gathers in [`crate::levels::EnergyLevels`].

pub mod canonical;
pub mod gaussian;
pub mod unweighted;
pub mod walkers;
pub mod wang_landau;

pub use canonical::Canonical;
pub use gaussian::{GaussianMode, GaussianWeights};
pub use unweighted::Unweighted;
pub use walkers::WalkerWeights;
pub use wang_landau::WangLandau;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::simulation::Simulation;

/// A method for choosing energy weights
pub trait WeightStrategy {
    /// Short tag naming the method, used in default output filenames
    fn tag(&self) -> String;

    /// The whole log-weight table
    fn ln_weights(&self) -> &[f64];

    /// Natural log of the weight of `energy`
    fn ln_weight(&self, energy: usize) -> f64 {
        self.ln_weights()[energy]
    }

    /// The weight of `energy`
    fn weight(&self, energy: usize) -> f64 {
        self.ln_weight(energy).exp()
    }

    /// Called after every move attempt with the level the system sits at
    fn observe(&mut self, _energy: usize) {}

    /// Called once per sweep while the weights are being set up; returns
    /// whether the table changed
    fn maybe_update(&mut self, _sim: &mut Simulation) -> bool {
        false
    }

    /// The max-entropy state the table was built around, if the method fixes
    /// one. The max-entropy search then keeps it instead of estimating.
    fn max_entropy_state(&self) -> Option<usize> {
        None
    }

    /// Drive the simulation until the weights are ready for production
    fn initialize(&mut self, sim: &mut Simulation) -> Result<(), SimError>;
}

/// Histogram method selection, as written in a configuration file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Method {
    /// Plain Metropolis sampling of the hard-sphere ensemble
    NoWeights,
    /// Fixed temperature
    Canonical { kt: f64 },
    /// A single Gaussian fit to the energy histogram
    Gaussian {
        #[serde(default = "default_gaussian_scale")]
        scale: f64,
        #[serde(default = "default_sample_sweeps")]
        sample_sweeps: u64,
    },
    /// A Gaussian fit refined by flattening passes until the sampled
    /// histogram spans the observed range
    Flat {
        #[serde(default = "default_gaussian_cutoff")]
        cutoff: f64,
        #[serde(default = "default_sample_sweeps")]
        sample_sweeps: u64,
        #[serde(default = "default_max_passes")]
        max_passes: usize,
    },
    /// Wang-Landau
    WangLandau {
        #[serde(default = "default_wl_factor")]
        factor: f64,
        #[serde(default = "default_wl_fmod")]
        fmod: f64,
        #[serde(default = "default_wl_threshold")]
        threshold: f64,
        #[serde(default = "default_wl_cutoff")]
        cutoff: f64,
        #[serde(default = "default_wl_check_period")]
        check_period: u64,
    },
    /// Walker optimization of the round trip rate
    Walkers {
        /// Sweeps before the first update; defaults to the number of levels
        first_update: Option<u64>,
    },
}

// Default value functions
pub fn default_gaussian_scale() -> f64 {
    10.0
}
pub fn default_gaussian_cutoff() -> f64 {
    0.25
}
pub fn default_sample_sweeps() -> u64 {
    10_000
}
pub fn default_max_passes() -> usize {
    100
}
pub fn default_wl_factor() -> f64 {
    0.125
}
pub fn default_wl_fmod() -> f64 {
    2.0
}
pub fn default_wl_threshold() -> f64 {
    3.0
}
pub fn default_wl_cutoff() -> f64 {
    1e-6
}
pub fn default_wl_check_period() -> u64 {
    100
}

impl Method {
    /// Wang-Landau with every parameter at its default
    pub fn wang_landau() -> Self {
        Method::WangLandau {
            factor: default_wl_factor(),
            fmod: default_wl_fmod(),
            threshold: default_wl_threshold(),
            cutoff: default_wl_cutoff(),
            check_period: default_wl_check_period(),
        }
    }

    pub fn gaussian() -> Self {
        Method::Gaussian {
            scale: default_gaussian_scale(),
            sample_sweeps: default_sample_sweeps(),
        }
    }

    pub fn flat() -> Self {
        Method::Flat {
            cutoff: default_gaussian_cutoff(),
            sample_sweeps: default_sample_sweeps(),
            max_passes: default_max_passes(),
        }
    }

    /// Check the method parameters
    pub fn validate(&self) -> Result<(), SimError> {
        match *self {
            Method::NoWeights => Ok(()),
            Method::Canonical { kt } => {
                if kt <= 0.0 {
                    return Err(SimError::invalid("kT", "temperature must be positive"));
                }
                Ok(())
            }
            Method::Gaussian {
                scale,
                sample_sweeps,
            } => {
                if scale <= 0.0 {
                    return Err(SimError::invalid("scale", "Gaussian scale must be positive"));
                }
                if sample_sweeps == 0 {
                    return Err(SimError::invalid("sample_sweeps", "must be positive"));
                }
                Ok(())
            }
            Method::Flat {
                cutoff,
                sample_sweeps,
                ..
            } => {
                if cutoff <= 0.0 {
                    return Err(SimError::invalid("cutoff", "Gaussian cutoff must be positive"));
                }
                if sample_sweeps == 0 {
                    return Err(SimError::invalid("sample_sweeps", "must be positive"));
                }
                Ok(())
            }
            Method::WangLandau {
                factor,
                fmod,
                threshold,
                cutoff,
                check_period,
            } => {
                if factor <= 0.0 || cutoff <= 0.0 || threshold <= 0.0 {
                    return Err(SimError::invalid(
                        "wang_landau",
                        "factor, threshold and cutoff must be positive",
                    ));
                }
                if fmod <= 1.0 {
                    return Err(SimError::invalid("wl_fmod", "must exceed 1 for the factor to shrink"));
                }
                if check_period == 0 {
                    return Err(SimError::invalid("check_period", "must be positive"));
                }
                Ok(())
            }
            Method::Walkers { first_update } => {
                if first_update == Some(0) {
                    return Err(SimError::invalid("first_update", "must be positive"));
                }
                Ok(())
            }
        }
    }
}

/// Build the weight method selected by `method` for a table of
/// `energy_levels` levels. `initialization_iterations` is the length of
/// the walker optimization phase.
pub fn build_strategy(
    method: &Method,
    energy_levels: usize,
    initialization_iterations: u64,
) -> Box<dyn WeightStrategy> {
    match *method {
        Method::NoWeights => Box::new(Unweighted::new(energy_levels)),
        Method::Canonical { kt } => Box::new(Canonical::new(energy_levels, kt)),
        Method::Gaussian {
            scale,
            sample_sweeps,
        } => Box::new(GaussianWeights::new(
            energy_levels,
            GaussianMode::Single { scale },
            sample_sweeps,
        )),
        Method::Flat {
            cutoff,
            sample_sweeps,
            max_passes,
        } => Box::new(GaussianWeights::new(
            energy_levels,
            GaussianMode::Flat { cutoff, max_passes },
            sample_sweeps,
        )),
        Method::WangLandau {
            factor,
            fmod,
            threshold,
            cutoff,
            check_period,
        } => Box::new(WangLandau::new(
            energy_levels,
            factor,
            fmod,
            threshold,
            cutoff,
            check_period,
        )),
        Method::Walkers { first_update } => Box::new(WalkerWeights::new(
            energy_levels,
            first_update.unwrap_or(energy_levels as u64),
            initialization_iterations,
        )),
    }
}

/// Level with the largest estimated density of states, `ln H(e) − ln w(e)`,
/// among the levels present in `histogram`
pub fn most_probable_state<W: WeightStrategy + ?Sized>(histogram: &[u64], weights: &W) -> Option<usize> {
    histogram
        .iter()
        .enumerate()
        .filter(|&(_, &h)| h > 0)
        .map(|(e, &h)| (e, (h as f64).ln() - weights.ln_weight(e)))
        .fold(None, |best: Option<(usize, f64)>, (e, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((e, s)),
        })
        .map(|(e, _)| e)
}
