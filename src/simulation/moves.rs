use nalgebra::Vector3;
use rand::Rng;
use rand_distr::StandardNormal;

use super::Simulation;
use crate::error::SimError;
use crate::geometry::{count_interactions, count_interactions_at, overlap};
use crate::weights::WeightStrategy;

/// What happened to a single move attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted,
    /// Refused by the weight ratio
    Rejected,
    /// The trial position crossed a wall
    OutOfCell,
    /// The trial position overlapped another ball
    Overlap,
}

impl Simulation {
    fn random_displacement(&mut self) -> Vector3<f64> {
        let g = Vector3::new(
            self.rng.sample::<f64, _>(StandardNormal),
            self.rng.sample::<f64, _>(StandardNormal),
            self.rng.sample::<f64, _>(StandardNormal),
        );
        g * self.translation_distance
    }

    /// Attempt to move the next ball in round robin order
    pub fn move_a_ball<W: WeightStrategy + ?Sized>(
        &mut self,
        weights: &mut W,
    ) -> Result<MoveOutcome, SimError> {
        let outcome = self.attempt(weights)?;
        self.end_move_updates(weights);
        #[cfg(feature = "verify")]
        self.verify_interactions()?;
        Ok(outcome)
    }

    fn attempt<W: WeightStrategy + ?Sized>(&mut self, weights: &W) -> Result<MoveOutcome, SimError> {
        let id = (self.moves.total % self.n() as u64) as usize;
        self.moves.total += 1;

        let step = self.random_displacement();
        let trial = self.cell.wrap(self.balls[id].pos + step);
        if !self.cell.in_cell(&trial) {
            return Ok(MoveOutcome::OutOfCell);
        }

        let ball = &self.balls[id];
        let relocated = if self.cell.distance(&trial, &ball.neighbor_center) > self.dr {
            Some(self.neighbors.find(&self.balls, &self.cell, id, &trial)?)
        } else {
            None
        };
        let candidates = relocated.as_deref().unwrap_or(&ball.neighbors);

        if candidates
            .iter()
            .any(|&j| overlap(&self.cell, &trial, ball.radius, &self.balls[j]))
        {
            return Ok(MoveOutcome::Overlap);
        }

        let old_count = count_interactions(&self.cell, &self.balls, id, self.interaction_distance);
        let new_count = count_interactions_at(
            &self.cell,
            &self.balls,
            id,
            &trial,
            candidates,
            self.interaction_distance,
        );
        let energy = self.interactions + new_count - old_count;
        if energy >= self.energy_levels {
            return Err(SimError::EnergyOutOfRange {
                level: energy,
                levels: self.energy_levels,
            });
        }

        let ln_probability = weights.ln_weight(energy) - weights.ln_weight(self.interactions);
        if ln_probability < 0.0 && self.rng.gen::<f64>() > ln_probability.exp() {
            return Ok(MoveOutcome::Rejected);
        }

        self.balls[id].pos = trial;
        self.interactions = energy;
        if let Some(list) = relocated {
            self.moves.informs += self.neighbors.relocate(&mut self.balls, id, trial, list)? as u64;
            self.moves.updates += 1;
        }
        self.moves.working += 1;
        Ok(MoveOutcome::Accepted)
    }

    /// Bookkeeping after every attempt, accepted or not
    fn end_move_updates<W: WeightStrategy + ?Sized>(&mut self, weights: &mut W) {
        if self.moves.total % self.n() as u64 == 0 {
            self.iteration += 1;
        }
        let energy = self.interactions;
        self.max_observed_interactions = self.max_observed_interactions.max(energy);
        self.levels
            .record(energy, self.state_of_max_entropy, self.max_observed_interactions);
        weights.observe(energy);
    }
}
