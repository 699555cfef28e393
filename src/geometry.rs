//! Cell geometry and the pair relations between balls.

use nalgebra::Vector3;
use std::f64::consts::PI;

use crate::ball::Ball;

/// Densest packing fraction of equal spheres, π/(3√2)
pub const CLOSE_PACKING: f64 = 0.740_480_489_693_061;

/// Rectangular simulation cell with hard walls along the first `walls`
/// dimensions (in x, y, z order) and periodic boundaries along the rest.
///
/// Walls confine ball centers to `[0, L)`; the hard surface therefore sits one
/// ball radius outside the cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub lengths: Vector3<f64>,
    pub walls: usize,
}

impl Cell {
    pub fn new(lengths: [f64; 3], walls: usize) -> Self {
        Cell {
            lengths: Vector3::from(lengths),
            walls,
        }
    }

    pub fn volume(&self) -> f64 {
        self.lengths.x * self.lengths.y * self.lengths.z
    }

    /// Displacement from `a` to `b`, using the minimum image along periodic
    /// dimensions and the direct difference along walled ones
    pub fn periodic_diff(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
        let mut d = b - a;
        for k in self.walls..3 {
            let l = self.lengths[k];
            d[k] -= l * (d[k] / l).round();
        }
        d
    }

    pub fn distance(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
        self.periodic_diff(a, b).norm()
    }

    /// Fold a position back into `[0, L)` along the periodic dimensions
    pub fn wrap(&self, mut pos: Vector3<f64>) -> Vector3<f64> {
        for k in self.walls..3 {
            let l = self.lengths[k];
            pos[k] -= l * (pos[k] / l).floor();
            // floor can leave exactly L behind for tiny negative inputs
            if pos[k] >= l {
                pos[k] = 0.0;
            }
        }
        pos
    }

    /// Whether a center lies inside the region allowed by the walls
    pub fn in_cell(&self, pos: &Vector3<f64>) -> bool {
        (0..self.walls).all(|k| pos[k] >= 0.0 && pos[k] < self.lengths[k])
    }

    pub fn min_length(&self) -> f64 {
        self.lengths.min()
    }
}

/// Hard-core overlap between two spheres
pub fn overlap(cell: &Cell, a_pos: &Vector3<f64>, a_radius: f64, b: &Ball) -> bool {
    let r = a_radius + b.radius;
    cell.periodic_diff(a_pos, &b.pos).norm_squared() < r * r
}

/// Whether two centers are within the interaction cutoff
#[inline]
pub fn interacts(cell: &Cell, a: &Vector3<f64>, b: &Vector3<f64>, distance: f64) -> bool {
    cell.periodic_diff(a, b).norm_squared() < distance * distance
}

/// Number of interacting pairs the ball at `pos` would form with `candidates`,
/// skipping `id` itself
pub fn count_interactions_at(
    cell: &Cell,
    balls: &[Ball],
    id: usize,
    pos: &Vector3<f64>,
    candidates: &[usize],
    distance: f64,
) -> usize {
    candidates
        .iter()
        .filter(|&&j| j != id && interacts(cell, pos, &balls[j].pos, distance))
        .count()
}

/// Interactions of ball `id` at its current position, using its neighbor list
pub fn count_interactions(cell: &Cell, balls: &[Ball], id: usize, distance: f64) -> usize {
    count_interactions_at(cell, balls, id, &balls[id].pos, &balls[id].neighbors, distance)
}

/// Total number of interacting pairs, computed the slow way over all pairs
pub fn count_all_interactions(cell: &Cell, balls: &[Ball], distance: f64) -> usize {
    let mut count = 0;
    for i in 0..balls.len() {
        for j in (i + 1)..balls.len() {
            if interacts(cell, &balls[i].pos, &balls[j].pos, distance) {
                count += 1;
            }
        }
    }
    count
}

/// Upper bound on how many balls of `radius` can have centers within
/// `distance` of a given center.
///
/// Every such ball fits inside a sphere of radius `distance + radius`, which
/// cannot be filled beyond close packing.
pub fn max_balls_within(distance: f64, radius: f64) -> usize {
    let outer = (distance + radius) / radius;
    let ball_volume = 4.0 / 3.0 * PI;
    let outer_volume = 4.0 / 3.0 * PI * outer * outer * outer;
    (CLOSE_PACKING * outer_volume / ball_volume).floor() as usize
}

/// Fraction of the cell volume occupied by the balls
pub fn filling_fraction(n: usize, radius: f64, cell: &Cell) -> f64 {
    n as f64 * 4.0 / 3.0 * PI * radius.powi(3) / cell.volume()
}
