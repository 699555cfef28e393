//! Walker optimization of the energy weights.
//!
//! A walker is labelled "up" after it touches the max-entropy state and
//! "down" after it touches the highest interaction count seen. The fraction
//! of up walkers at each level measures how well the weights move the
//! system across the energy range, and the weights are reshaped so that
//! this fraction falls off evenly.

use tracing::{info, warn};

use super::WeightStrategy;
use crate::error::SimError;
use crate::levels::EnergyLevels;
use crate::simulation::Simulation;

#[derive(Debug, Clone)]
pub struct WalkerWeights {
    ln_weights: Vec<f64>,
    first_update: u64,
    phase_length: u64,
    phase_start: u64,
    next_update: u64,
    /// Sweeps into the phase at which the weights were updated
    pub updates: Vec<u64>,
}

/// Reshape `ln_weights` from the walker counts in `levels`.
///
/// Returns false when fewer than two levels have been visited.
pub fn walker_update(ln_weights: &mut [f64], levels: &EnergyLevels) -> bool {
    let Some((lo, hi)) = levels.visited_range() else {
        return false;
    };
    if hi == lo {
        return false;
    }
    let fraction = |e: usize| -> Option<f64> {
        let total = levels.walkers_total[e];
        (total > 0).then(|| levels.walkers_up[e] as f64 / total as f64)
    };
    let min_slope = 0.01 / (hi - lo) as f64;

    let mut updated = ln_weights.to_vec();
    for e in lo..=hi {
        let visits = levels.visits[e];
        let Some(f) = fraction(e) else {
            continue;
        };
        if visits == 0 {
            continue;
        }
        let below = if e > lo { fraction(e - 1) } else { None };
        let above = if e < hi { fraction(e + 1) } else { None };
        let slope = match (below, above) {
            (Some(b), Some(a)) => (a - b) / 2.0,
            (Some(b), None) => f - b,
            (None, Some(a)) => a - f,
            (None, None) => 0.0,
        };
        let slope = slope.abs().max(min_slope);
        updated[e] += 0.5 * (slope.ln() - (visits as f64).ln());
    }
    let (low_edge, high_edge) = (updated[lo], updated[hi]);
    updated[..lo].fill(low_edge);
    updated[hi + 1..].fill(high_edge);
    ln_weights.copy_from_slice(&updated);
    true
}

impl WalkerWeights {
    pub fn new(energy_levels: usize, first_update: u64, phase_length: u64) -> Self {
        WalkerWeights {
            ln_weights: vec![0.0; energy_levels],
            first_update,
            phase_length,
            phase_start: 0,
            next_update: first_update,
            updates: Vec::new(),
        }
    }
}

impl WeightStrategy for WalkerWeights {
    fn tag(&self) -> String {
        "walkers".to_string()
    }

    fn ln_weights(&self) -> &[f64] {
        &self.ln_weights
    }

    fn maybe_update(&mut self, sim: &mut Simulation) -> bool {
        let elapsed = sim.iteration - self.phase_start;
        if elapsed != self.next_update {
            return false;
        }
        self.next_update *= 2;
        info!("Weight update {} after {} sweeps", self.updates.len() + 1, elapsed);
        let changed = walker_update(&mut self.ln_weights, &sim.levels);
        sim.levels.reset_walkers();
        sim.levels.reset_visits();
        self.updates.push(elapsed);
        changed
    }

    fn initialize(&mut self, sim: &mut Simulation) -> Result<(), SimError> {
        self.phase_start = sim.iteration;
        self.next_update = self.first_update;
        sim.levels.reset_walkers();
        sim.levels.reset_visits();
        if self.phase_length < self.first_update {
            warn!(
                "Walker phase of {} sweeps ends before the first update at {}",
                self.phase_length, self.first_update
            );
        }
        while sim.iteration - self.phase_start < self.phase_length {
            sim.sweep(self)?;
            self.maybe_update(sim);
        }
        Ok(())
    }
}
