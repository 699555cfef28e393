// Square-well fluid Monte Carlo with adaptive energy weights

pub mod ball;
pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod histograms;
pub mod io;
pub mod lattice;
pub mod levels;
pub mod neighbors;
pub mod simulation;
pub mod weights;

pub use error::SimError;
pub use histograms::{HistogramParams, Histograms};
pub use simulation::{MoveOutcome, SimParams, Simulation};
pub use weights::{build_strategy, Method, WeightStrategy};
