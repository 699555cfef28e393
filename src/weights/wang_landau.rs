use tracing::{debug, info};

use super::WeightStrategy;
use crate::error::SimError;
use crate::levels::EnergyLevels;
use crate::simulation::Simulation;

/// Wang-Landau weights.
///
/// While adapting, every visit to a level lowers its log weight by the
/// current factor. Once the visit histogram is flat enough the factor is
/// divided by `fmod` and the histogram restarted, until the factor drops
/// below `cutoff`.
#[derive(Debug, Clone)]
pub struct WangLandau {
    ln_weights: Vec<f64>,
    factor: f64,
    fmod: f64,
    threshold: f64,
    cutoff: f64,
    check_period: u64,
    adapting: bool,
    /// Factor in use after each reduction
    pub factor_history: Vec<f64>,
}

/// Relative spread (standard deviation over mean) of the visits across the
/// visited range, or `None` before any visit
pub fn flatness(levels: &EnergyLevels) -> Option<f64> {
    let (lo, hi) = levels.visited_range()?;
    let counts = &levels.visits[lo..=hi];
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<u64>() as f64 / n;
    let variance = counts
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    Some(variance.sqrt() / mean)
}

impl WangLandau {
    pub fn new(
        energy_levels: usize,
        factor: f64,
        fmod: f64,
        threshold: f64,
        cutoff: f64,
        check_period: u64,
    ) -> Self {
        WangLandau {
            ln_weights: vec![0.0; energy_levels],
            factor,
            fmod,
            threshold,
            cutoff,
            check_period,
            adapting: false,
            factor_history: Vec::new(),
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn is_adapting(&self) -> bool {
        self.adapting
    }
}

impl WeightStrategy for WangLandau {
    fn tag(&self) -> String {
        "wang_landau".to_string()
    }

    fn ln_weights(&self) -> &[f64] {
        &self.ln_weights
    }

    fn observe(&mut self, energy: usize) {
        if self.adapting {
            self.ln_weights[energy] -= self.factor;
        }
    }

    fn maybe_update(&mut self, sim: &mut Simulation) -> bool {
        if !self.adapting || sim.iteration % self.check_period != 0 {
            return false;
        }
        match flatness(&sim.levels) {
            Some(spread) if spread < self.threshold => {
                self.factor /= self.fmod;
                self.factor_history.push(self.factor);
                sim.levels.reset_visits();
                debug!(
                    "histogram spread {:.3} at iteration {}, factor now {:e}",
                    spread, sim.iteration, self.factor
                );
                true
            }
            _ => false,
        }
    }

    fn initialize(&mut self, sim: &mut Simulation) -> Result<(), SimError> {
        self.adapting = true;
        sim.levels.reset_visits();
        while self.factor >= self.cutoff {
            sim.sweep(self)?;
            self.maybe_update(sim);
        }
        self.adapting = false;
        info!(
            "Wang-Landau done after {} factor reductions, final factor {:e}",
            self.factor_history.len(),
            self.factor
        );
        Ok(())
    }
}
