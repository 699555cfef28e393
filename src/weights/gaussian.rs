//! Weights from Gaussian fits to the energy histogram.
//!
//! Near its peak the histogram of an unweighted run is roughly Gaussian in
//! the energy. Dividing it out raises the weight of the rare high
//! interaction levels, so that later sampling reaches further along the
//! energy axis. The fits stay centered on the unweighted peak: once the
//! weights are raised the sampler rarely returns there, and an estimate
//! made from weighted samples would creep up toward the top of the range.

use tracing::{info, warn};

use super::WeightStrategy;
use crate::error::SimError;
use crate::simulation::Simulation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GaussianMode {
    /// One fit, each level raised by at most `scale`
    Single { scale: f64 },
    /// One steep fit, then passes that flatten the sampled histogram until
    /// the sampled width is at least `cutoff` times the observed energy range
    Flat { cutoff: f64, max_passes: usize },
}

#[derive(Debug, Clone)]
pub struct GaussianWeights {
    mode: GaussianMode,
    sample_sweeps: u64,
    ln_weights: Vec<f64>,
    passes: usize,
    /// Unweighted max-entropy state, fixed by the first fit
    center: Option<usize>,
    width: f64,
    range: f64,
}

/// Standard deviation of the level distribution described by `visits`
pub(super) fn histogram_width(visits: &[u64]) -> f64 {
    let total: u64 = visits.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let mean = visits
        .iter()
        .enumerate()
        .map(|(e, &v)| e as f64 * v as f64)
        .sum::<f64>()
        / total;
    let variance = visits
        .iter()
        .enumerate()
        .map(|(e, &v)| (e as f64 - mean).powi(2) * v as f64)
        .sum::<f64>()
        / total;
    variance.sqrt()
}

impl GaussianWeights {
    pub fn new(energy_levels: usize, mode: GaussianMode, sample_sweeps: u64) -> Self {
        GaussianWeights {
            mode,
            sample_sweeps,
            ln_weights: vec![0.0; energy_levels],
            passes: 0,
            center: None,
            width: 0.0,
            range: 0.0,
        }
    }

    /// Number of fits and flattening passes made so far
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Largest width measured by [`GaussianWeights::flatten`]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Observed energy range above the center at the last pass
    pub fn range(&self) -> f64 {
        self.range
    }

    fn sample(&mut self, sim: &mut Simulation) -> Result<usize, SimError> {
        let center = *self.center.get_or_insert(sim.state_of_max_entropy);
        sim.levels.reset_visits();
        for _ in 0..self.sample_sweeps {
            sim.sweep(self)?;
        }
        Ok(center)
    }

    /// Raise the weights above the center by a Gaussian fit to a freshly
    /// sampled histogram. Returns the width over which the raise stays
    /// below `scale`.
    pub fn fit(&mut self, sim: &mut Simulation, scale: f64) -> Result<f64, SimError> {
        let mu = self.sample(sim)?;
        let sigma = histogram_width(&sim.levels.visits);
        for (e, w) in self.ln_weights.iter_mut().enumerate().skip(mu + 1) {
            let x = (e - mu) as f64;
            *w += (x * x / (2.0 * sigma * sigma)).min(scale);
        }
        self.passes += 1;
        Ok(sigma * (2.0 * scale).sqrt())
    }

    /// Divide a freshly sampled histogram out of the weights between the
    /// center and the highest observed level, raising no level by more than
    /// `scale`. Levels outside that interval move with its nearest edge.
    /// Returns the width of the sampled histogram as for
    /// [`GaussianWeights::fit`], never less than on an earlier pass.
    pub fn flatten(&mut self, sim: &mut Simulation, scale: f64) -> Result<f64, SimError> {
        let mu = self.sample(sim)?;
        let hi = sim.max_observed_interactions.max(mu);
        let visits = &sim.levels.visits;
        let peak = visits[mu..=hi].iter().copied().max().unwrap_or(0).max(1) as f64;
        let raise: Vec<f64> = (mu..=hi)
            .map(|e| (peak / visits[e].max(1) as f64).ln().min(scale))
            .collect();
        for (e, w) in self.ln_weights.iter_mut().enumerate() {
            *w += raise[e.clamp(mu, hi) - mu];
        }
        let sigma = histogram_width(&sim.levels.visits);
        self.passes += 1;
        self.width = self.width.max(sigma * (2.0 * scale).sqrt());
        Ok(self.width)
    }
}

impl WeightStrategy for GaussianWeights {
    fn tag(&self) -> String {
        match self.mode {
            GaussianMode::Single { .. } => "gaussian".to_string(),
            GaussianMode::Flat { .. } => "flat".to_string(),
        }
    }

    fn ln_weights(&self) -> &[f64] {
        &self.ln_weights
    }

    fn max_entropy_state(&self) -> Option<usize> {
        self.center
    }

    fn initialize(&mut self, sim: &mut Simulation) -> Result<(), SimError> {
        match self.mode {
            GaussianMode::Single { scale } => {
                let width = self.fit(sim, scale)?;
                info!("Gaussian fit has width {:.1}", width);
            }
            GaussianMode::Flat { cutoff, max_passes } => {
                self.fit(sim, 1e40f64.ln())?;
                sim.initialize_max_entropy_and_translation_distance(self)?;
                loop {
                    let width = self.flatten(sim, 10f64.ln())?;
                    self.range = sim
                        .max_observed_interactions
                        .saturating_sub(sim.state_of_max_entropy) as f64;
                    sim.initialize_max_entropy_and_translation_distance(self)?;
                    info!(
                        "Histogram has width {:.1} compared to range {:.0} (ratio {:.2})",
                        width,
                        self.range,
                        width / self.range
                    );
                    if width >= cutoff * self.range {
                        break;
                    }
                    if self.passes >= max_passes {
                        warn!(
                            "Stopping after {} passes without covering the energy range",
                            self.passes
                        );
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
