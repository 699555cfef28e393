use super::WeightStrategy;
use crate::error::SimError;
use crate::simulation::Simulation;

/// Boltzmann weights at a fixed temperature.
///
/// Level `e` has energy `-e` in units of the well depth, so its weight is
/// `exp(e/kT)`.
#[derive(Debug, Clone)]
pub struct Canonical {
    kt: f64,
    ln_weights: Vec<f64>,
}

impl Canonical {
    pub fn new(energy_levels: usize, kt: f64) -> Self {
        let ln_weights = (0..energy_levels).map(|e| e as f64 / kt).collect();
        Canonical { kt, ln_weights }
    }
}

impl WeightStrategy for Canonical {
    fn tag(&self) -> String {
        format!("kT{}", self.kt)
    }

    fn ln_weights(&self) -> &[f64] {
        &self.ln_weights
    }

    fn initialize(&mut self, _sim: &mut Simulation) -> Result<(), SimError> {
        Ok(())
    }
}
