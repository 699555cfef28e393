use nalgebra::Vector3;

/// A hard sphere together with its cached neighbor table
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    /// Center of the ball
    pub pos: Vector3<f64>,
    /// Hard-core radius
    pub radius: f64,
    /// Indices of the balls inside this ball's neighbor sphere
    pub neighbors: Vec<usize>,
    /// Center of the neighbor sphere, i.e. where the ball was when its
    /// neighbor table was last built
    pub neighbor_center: Vector3<f64>,
}

impl Ball {
    pub fn new(pos: Vector3<f64>, radius: f64) -> Self {
        Ball {
            pos,
            radius,
            neighbors: Vec::new(),
            neighbor_center: pos,
        }
    }

    pub fn num_neighbors(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_neighbor(&self, other: usize) -> bool {
        self.neighbors.contains(&other)
    }
}
