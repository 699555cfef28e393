//! The square-well simulation context.
//!
//! A [`Simulation`] owns the balls, their neighbor tables, the running
//! interaction count and the per-level bookkeeping. Weight methods are kept
//! outside it and passed to every sweep, so that a method can drive the
//! simulation while it adapts its own table.

mod moves;

pub use moves::MoveOutcome;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::ball::Ball;
use crate::error::SimError;
use crate::geometry::{self, count_all_interactions, filling_fraction, max_balls_within, Cell};
use crate::lattice;
use crate::levels::EnergyLevels;
use crate::neighbors::{check_neighbor_symmetry, NeighborIndex};
use crate::weights::{most_probable_state, WeightStrategy};

/// Physical and numerical parameters of a simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    /// Number of balls
    pub n: usize,
    /// Hard-core radius
    pub radius: f64,
    /// Well range in units of the hard-core diameter
    pub well_width: f64,
    /// Cell lengths
    pub lengths: [f64; 3],
    /// Number of walled dimensions, counted from x
    pub walls: usize,
    /// Neighbor sphere radius in units of `radius · well_width`
    pub neighbor_scale: f64,
    /// Initial translation step in units of `radius`
    pub translation_scale: f64,
    /// Neighbor table margin in units of `radius`
    pub dr: f64,
    /// Acceptance rate the translation step is tuned toward
    pub acceptance_goal: f64,
    pub seed: u64,
    /// Sweeps between translation step adjustments
    pub tune_period: u64,
    /// Bounds on the length of the max-entropy search, in sweeps
    pub min_search_sweeps: u64,
    pub max_search_sweeps: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            n: 1000,
            radius: 1.0,
            well_width: 1.3,
            lengths: [20.0, 20.0, 20.0],
            walls: 0,
            neighbor_scale: 2.0,
            translation_scale: 0.05,
            dr: 0.1,
            acceptance_goal: 0.4,
            seed: 0,
            tune_period: 100,
            min_search_sweeps: 1_000,
            max_search_sweeps: 100_000,
        }
    }
}

impl SimParams {
    pub fn neighbor_radius(&self) -> f64 {
        self.neighbor_scale * self.radius * self.well_width
    }

    pub fn interaction_distance(&self) -> f64 {
        2.0 * self.radius * self.well_width
    }

    /// Check that the parameters describe a system that can be simulated
    pub fn validate(&self) -> Result<(), SimError> {
        if self.n == 0 {
            return Err(SimError::invalid("N", "at least one ball is needed"));
        }
        if self.radius <= 0.0 {
            return Err(SimError::invalid("R", "radius must be positive"));
        }
        if self.well_width < 1.0 {
            return Err(SimError::invalid("well_width", "interaction scale should be at least 1"));
        }
        if self.walls > 3 {
            return Err(SimError::TooManyWalls(self.walls));
        }
        if self.lengths.iter().any(|&l| l <= 0.0) {
            return Err(SimError::invalid(
                "lengths",
                format!("cell lengths must be positive, got {:?}", self.lengths),
            ));
        }
        if self.neighbor_scale <= 0.0 || self.dr <= 0.0 {
            return Err(SimError::invalid("neighbor_scale", "neighbor radius and margin must be positive"));
        }
        if self.translation_scale <= 0.0 {
            return Err(SimError::invalid("translation_scale", "must be positive"));
        }
        if !(self.acceptance_goal > 0.0 && self.acceptance_goal < 1.0) {
            return Err(SimError::invalid("acceptance_goal", "must lie strictly between 0 and 1"));
        }
        if self.tune_period == 0 {
            return Err(SimError::invalid("tune_period", "must be positive"));
        }
        if self.min_search_sweeps > self.max_search_sweeps {
            return Err(SimError::invalid(
                "min_search_sweeps",
                "must not exceed max_search_sweeps",
            ));
        }
        if self.interaction_distance() > 2.0 * self.radius + self.neighbor_radius() {
            return Err(SimError::invalid(
                "neighbor_scale",
                "neighbor sphere does not cover the interaction range",
            ));
        }
        let cell = Cell::new(self.lengths, self.walls);
        let eta = filling_fraction(self.n, self.radius, &cell);
        if eta > 1.0 {
            return Err(SimError::Overfilled(eta));
        }
        Ok(())
    }
}

/// Move counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveStats {
    /// Attempted moves
    pub total: u64,
    /// Accepted moves
    pub working: u64,
    /// Neighbor table relocations
    pub updates: u64,
    /// Edits made to other balls' tables during relocations
    pub informs: u64,
}

impl MoveStats {
    pub fn acceptance_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.working as f64 / self.total as f64
        }
    }
}

/// A square-well fluid in a rectangular cell
#[derive(Debug, Clone)]
pub struct Simulation {
    pub params: SimParams,
    pub cell: Cell,
    pub balls: Vec<Ball>,
    pub neighbors: NeighborIndex,
    /// Number of interacting pairs, maintained incrementally
    pub interactions: usize,
    /// Completed sweeps
    pub iteration: u64,
    pub translation_distance: f64,
    /// Neighbor table margin
    pub dr: f64,
    /// Neighbor sphere radius, margin excluded
    pub neighbor_r: f64,
    pub interaction_distance: f64,
    pub energy_levels: usize,
    pub levels: EnergyLevels,
    pub moves: MoveStats,
    pub state_of_max_entropy: usize,
    pub max_observed_interactions: usize,
    /// Check the tracked state after every sweep
    pub debug: bool,
    rng: StdRng,
}

impl Simulation {
    /// Build a simulation with balls placed on an fcc lattice
    pub fn new(params: &SimParams) -> Result<Self, SimError> {
        params.validate()?;
        let cell = Cell::new(params.lengths, params.walls);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let positions = lattice::place_on_fcc(params.n, params.radius, &cell, &mut rng)?;
        Self::assemble(params, positions, rng)
    }

    /// Build a simulation from explicit ball positions
    pub fn with_positions(params: &SimParams, positions: Vec<Vector3<f64>>) -> Result<Self, SimError> {
        if positions.len() != params.n {
            return Err(SimError::invalid(
                "positions",
                format!("{} positions given for {} balls", positions.len(), params.n),
            ));
        }
        params.validate()?;
        Self::assemble(params, positions, StdRng::seed_from_u64(params.seed))
    }

    fn assemble(params: &SimParams, positions: Vec<Vector3<f64>>, rng: StdRng) -> Result<Self, SimError> {
        let cell = Cell::new(params.lengths, params.walls);
        let radius = params.radius;
        let dr = params.dr * radius;
        let neighbor_r = params.neighbor_radius();
        let interaction_distance = params.interaction_distance();

        let max_neighbors =
            max_balls_within(2.0 * radius + neighbor_r + 2.0 * dr, radius).min(params.n - 1);
        let energy_levels = params.n * max_balls_within(interaction_distance, radius) / 2 + 1;
        info!(
            "Neighbor radius {:.4} with margin {:.4}, at most {} neighbors and {} energy levels",
            neighbor_r, dr, max_neighbors, energy_levels
        );

        let mut balls: Vec<Ball> = positions.into_iter().map(|p| Ball::new(p, radius)).collect();
        let neighbors = NeighborIndex::new(neighbor_r + 2.0 * dr, max_neighbors);
        let most = neighbors.rebuild(&mut balls, &cell)?;
        info!(
            "Neighbor tables initialized. The most neighbors is {}, whereas the max allowed is {}",
            most, max_neighbors
        );

        check_placement(&cell, &balls)?;

        let interactions = count_all_interactions(&cell, &balls, interaction_distance);
        if interactions >= energy_levels {
            return Err(SimError::EnergyOutOfRange {
                level: interactions,
                levels: energy_levels,
            });
        }

        Ok(Simulation {
            params: params.clone(),
            cell,
            balls,
            neighbors,
            interactions,
            iteration: 0,
            translation_distance: params.translation_scale * radius,
            dr,
            neighbor_r,
            interaction_distance,
            energy_levels,
            levels: EnergyLevels::new(energy_levels),
            moves: MoveStats::default(),
            state_of_max_entropy: interactions,
            max_observed_interactions: interactions,
            debug: false,
            rng,
        })
    }

    pub fn n(&self) -> usize {
        self.balls.len()
    }

    pub fn filling_fraction(&self) -> f64 {
        filling_fraction(self.n(), self.params.radius, &self.cell)
    }

    pub fn neighbor_count(&self, id: usize) -> usize {
        self.balls[id].num_neighbors()
    }

    pub fn neighbors_of(&self, id: usize) -> &[usize] {
        &self.balls[id].neighbors
    }

    /// Whether ball `id` lies in the region allowed by the walls
    pub fn in_cell(&self, id: usize) -> bool {
        self.cell.in_cell(&self.balls[id].pos)
    }

    /// Whether ball `id` overlaps any other ball, checked against all balls
    pub fn overlaps(&self, id: usize) -> bool {
        let ball = &self.balls[id];
        self.balls
            .iter()
            .enumerate()
            .any(|(j, other)| j != id && geometry::overlap(&self.cell, &ball.pos, ball.radius, other))
    }

    /// Run `n` move attempts, one per ball
    pub fn sweep<W: WeightStrategy + ?Sized>(&mut self, weights: &mut W) -> Result<(), SimError> {
        for _ in 0..self.n() {
            self.move_a_ball(weights)?;
        }
        if self.debug {
            self.verify_interactions()?;
            check_neighbor_symmetry(&self.balls)?;
        }
        Ok(())
    }

    /// Recount every interaction and compare with the tracked count
    pub fn verify_interactions(&self) -> Result<(), SimError> {
        let actual = count_all_interactions(&self.cell, &self.balls, self.interaction_distance);
        if actual != self.interactions {
            return Err(SimError::InteractionMismatch {
                tracked: self.interactions,
                actual,
            });
        }
        Ok(())
    }

    pub fn check_neighbor_symmetry(&self) -> Result<(), SimError> {
        check_neighbor_symmetry(&self.balls)
    }

    /// Scale the translation step toward the acceptance goal, given the
    /// moves accepted and attempted since the last adjustment
    pub fn tune_translation_distance(&mut self, accepted: u64, attempted: u64) {
        if attempted == 0 {
            return;
        }
        let rate = accepted as f64 / attempted as f64;
        let factor = (rate / self.params.acceptance_goal).clamp(0.5, 2.0);
        let cap = self.cell.min_length() / 2.0;
        self.translation_distance = (self.translation_distance * factor).min(cap);
        debug!(
            "acceptance rate {:.3}, translation distance now {:.5}",
            rate, self.translation_distance
        );
    }

    /// Sample until the most probable energy level is settled, tuning the
    /// translation step along the way. The result is stored as
    /// `state_of_max_entropy` and returned. Weights that fix their own
    /// max-entropy state only get the translation step tuned, over
    /// `min_search_sweeps`.
    pub fn initialize_max_entropy_and_translation_distance<W: WeightStrategy + ?Sized>(
        &mut self,
        weights: &mut W,
    ) -> Result<usize, SimError> {
        info!("Moving to most probable state and tuning translation distance.");
        let pinned = weights.max_entropy_state();
        let period = self.params.tune_period;
        let mut seen = vec![0u64; self.energy_levels];
        let mut sweeps = 0;
        let mut state = self.interactions;
        loop {
            let before = self.moves;
            for _ in 0..period {
                self.sweep(weights)?;
                seen[self.interactions] += 1;
            }
            sweeps += period;
            self.tune_translation_distance(
                self.moves.working - before.working,
                self.moves.total - before.total,
            );
            state = pinned
                .or_else(|| most_probable_state(&seen, weights))
                .unwrap_or(state);
            if sweeps >= self.params.min_search_sweeps
                && (pinned.is_some()
                    || self.interactions == state
                    || sweeps >= self.params.max_search_sweeps)
            {
                break;
            }
        }
        self.state_of_max_entropy = state;
        info!(
            "Found max entropy state {} after {} sweeps, translation distance {:.5}",
            state, sweeps, self.translation_distance
        );
        Ok(state)
    }

    /// Forget the statistics gathered during initialization
    pub fn reset_statistics(&mut self) {
        self.moves = MoveStats::default();
        self.iteration = 0;
        self.levels.reset_visits();
        self.levels.reset_walkers();
        self.levels.reset_round_trips();
    }
}

/// Report every ball that is out of the cell or overlaps an earlier ball
fn check_placement(cell: &Cell, balls: &[Ball]) -> Result<(), SimError> {
    let mut report = String::new();
    for (i, ball) in balls.iter().enumerate() {
        if !cell.in_cell(&ball.pos) {
            report.push_str(&format!(
                "ball {} at ({:.4}, {:.4}, {:.4}) is outside the cell\n",
                i, ball.pos.x, ball.pos.y, ball.pos.z
            ));
        }
        for (j, other) in balls[..i].iter().enumerate() {
            if geometry::overlap(cell, &ball.pos, ball.radius, other) {
                report.push_str(&format!(
                    "ball {} overlaps ball {} (distance {:.4})\n",
                    i,
                    j,
                    cell.distance(&ball.pos, &other.pos)
                ));
            }
        }
    }
    if report.is_empty() {
        Ok(())
    } else {
        Err(SimError::InvalidPlacement(report))
    }
}

#[cfg(test)]
mod tests;
