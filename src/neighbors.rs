//! Per-ball neighbor tables.
//!
//! Two balls are neighbors when their neighbor-sphere centers are closer than
//! `R_a + R_b + radius`, where `radius` already includes a `2·dr` margin. The
//! relation depends only on the two centers, so it is symmetric by
//! construction, and a table stays valid while its ball is within `dr` of
//! the center it was built around.

use nalgebra::Vector3;
use tracing::debug;

use crate::ball::Ball;
use crate::error::SimError;
use crate::geometry::Cell;

/// Parameters of the neighbor tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborIndex {
    /// Neighbor-sphere radius beyond the two ball radii, margin included
    pub radius: f64,
    /// Fixed capacity of every table
    pub max_neighbors: usize,
}

impl NeighborIndex {
    pub fn new(radius: f64, max_neighbors: usize) -> Self {
        NeighborIndex {
            radius,
            max_neighbors,
        }
    }

    fn are_neighbors(&self, cell: &Cell, a_center: &Vector3<f64>, a_radius: f64, b: &Ball) -> bool {
        let r = a_radius + b.radius + self.radius;
        cell.periodic_diff(a_center, &b.neighbor_center).norm_squared() < r * r
    }

    /// Rebuild every table from scratch around the current positions.
    ///
    /// Returns the largest table size.
    pub fn rebuild(&self, balls: &mut [Ball], cell: &Cell) -> Result<usize, SimError> {
        for ball in balls.iter_mut() {
            ball.neighbor_center = ball.pos;
            ball.neighbors.clear();
        }
        let mut most = 0;
        for i in 0..balls.len() {
            let list = self.find(balls, cell, i, &balls[i].pos)?;
            most = most.max(list.len());
            balls[i].neighbors = list;
        }
        debug!("rebuilt {} neighbor tables, largest has {}", balls.len(), most);
        Ok(most)
    }

    /// Compute the table ball `id` would have if its neighbor sphere were
    /// centered at `center`, without touching any ball
    pub fn find(
        &self,
        balls: &[Ball],
        cell: &Cell,
        id: usize,
        center: &Vector3<f64>,
    ) -> Result<Vec<usize>, SimError> {
        let radius = balls[id].radius;
        let mut list = Vec::with_capacity(self.max_neighbors);
        for (j, other) in balls.iter().enumerate() {
            if j != id && self.are_neighbors(cell, center, radius, other) {
                if list.len() == self.max_neighbors {
                    return Err(SimError::TooManyNeighbors {
                        ball: id,
                        max: self.max_neighbors,
                    });
                }
                list.push(j);
            }
        }
        Ok(list)
    }

    /// Move the neighbor sphere of ball `id` to `center`, installing `list`
    /// (as computed by [`NeighborIndex::find`]) and informing every ball that
    /// enters or leaves it.
    ///
    /// Capacity is checked before anything is modified. Returns the number of
    /// other tables edited.
    pub fn relocate(
        &self,
        balls: &mut [Ball],
        id: usize,
        center: Vector3<f64>,
        list: Vec<usize>,
    ) -> Result<usize, SimError> {
        for &j in &list {
            if !balls[id].is_neighbor(j) && balls[j].neighbors.len() >= self.max_neighbors {
                return Err(SimError::TooManyNeighbors {
                    ball: j,
                    max: self.max_neighbors,
                });
            }
        }

        let old = std::mem::take(&mut balls[id].neighbors);
        let mut informs = 0;
        for &j in &old {
            if !list.contains(&j) {
                balls[j].neighbors.retain(|&k| k != id);
                informs += 1;
            }
        }
        for &j in &list {
            if !old.contains(&j) {
                balls[j].neighbors.push(id);
                informs += 1;
            }
        }
        balls[id].neighbors = list;
        balls[id].neighbor_center = center;
        Ok(informs)
    }
}

/// Make sure that every ball is its neighbor's neighbor
pub fn check_neighbor_symmetry(balls: &[Ball]) -> Result<(), SimError> {
    for (i, ball) in balls.iter().enumerate() {
        for &k in &ball.neighbors {
            if !balls[k].is_neighbor(i) {
                return Err(SimError::NeighborAsymmetry {
                    ball: i,
                    neighbor: k,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of_balls(spacing: f64, n: usize) -> Vec<Ball> {
        (0..n)
            .map(|i| Ball::new(Vector3::new(1.0 + spacing * i as f64, 5.0, 5.0), 1.0))
            .collect()
    }

    #[test]
    fn test_rebuild_is_symmetric() {
        let cell = Cell::new([20.0, 10.0, 10.0], 0);
        let mut balls = row_of_balls(2.5, 8);
        let index = NeighborIndex::new(1.0, 7);
        let most = index.rebuild(&mut balls, &cell).unwrap();

        // centers 2.5 apart, cutoff 1 + 1 + 1 = 3: nearest neighbors only,
        // plus the pair that meets through the periodic boundary
        assert_eq!(most, 2);
        assert_eq!(balls[3].neighbors, vec![2, 4]);
        assert_eq!(balls[0].neighbors, vec![1, 7]);
        assert!(check_neighbor_symmetry(&balls).is_ok());
    }

    #[test]
    fn test_walls_cut_the_wraparound_pair() {
        let cell = Cell::new([20.0, 10.0, 10.0], 1);
        let mut balls = row_of_balls(2.5, 8);
        let index = NeighborIndex::new(1.0, 7);
        index.rebuild(&mut balls, &cell).unwrap();
        assert_eq!(balls[0].neighbors, vec![1]);
        assert_eq!(balls[7].neighbors, vec![6]);
    }

    #[test]
    fn test_too_many_neighbors_is_an_error() {
        let cell = Cell::new([20.0, 10.0, 10.0], 0);
        let mut balls = row_of_balls(2.5, 8);
        let index = NeighborIndex::new(10.0, 3);
        let err = index.rebuild(&mut balls, &cell).unwrap_err();
        assert!(matches!(err, SimError::TooManyNeighbors { max: 3, .. }));
    }

    #[test]
    fn test_relocate_keeps_tables_symmetric() {
        let cell = Cell::new([20.0, 10.0, 10.0], 1);
        let mut balls = row_of_balls(2.5, 8);
        let index = NeighborIndex::new(1.0, 7);
        index.rebuild(&mut balls, &cell).unwrap();

        // carry ball 0 over next to ball 5
        let center = Vector3::new(1.0 + 2.5 * 5.0, 5.5, 5.0);
        balls[0].pos = center;
        let list = index.find(&balls, &cell, 0, &center).unwrap();
        assert_eq!(list, vec![4, 5, 6]);
        let informs = index.relocate(&mut balls, 0, center, list).unwrap();

        assert_eq!(informs, 4);
        assert!(!balls[1].is_neighbor(0));
        assert!(balls[5].is_neighbor(0));
        assert_eq!(balls[0].neighbor_center, center);
        assert!(check_neighbor_symmetry(&balls).is_ok());
    }

    #[test]
    fn test_asymmetry_is_reported() {
        let mut balls = row_of_balls(2.5, 3);
        balls[0].neighbors = vec![1];
        let err = check_neighbor_symmetry(&balls).unwrap_err();
        assert!(matches!(
            err,
            SimError::NeighborAsymmetry {
                ball: 0,
                neighbor: 1
            }
        ));
    }
}
