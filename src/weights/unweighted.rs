use super::WeightStrategy;
use crate::error::SimError;
use crate::simulation::Simulation;

/// Every level has the same weight
#[derive(Debug, Clone)]
pub struct Unweighted {
    ln_weights: Vec<f64>,
}

impl Unweighted {
    pub fn new(energy_levels: usize) -> Self {
        Unweighted {
            ln_weights: vec![0.0; energy_levels],
        }
    }
}

impl WeightStrategy for Unweighted {
    fn tag(&self) -> String {
        "nw".to_string()
    }

    fn ln_weights(&self) -> &[f64] {
        &self.ln_weights
    }

    fn initialize(&mut self, _sim: &mut Simulation) -> Result<(), SimError> {
        Ok(())
    }
}
