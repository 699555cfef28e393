//! Error type shared by the simulation engine
//!
//! Every variant is fatal: a simulation whose configuration or internal
//! bookkeeping is wrong cannot be trusted to continue.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring, initializing or running a simulation
#[derive(Debug, Error)]
pub enum SimError {
    #[error("exactly one histogram method must be selected, found {0}")]
    MethodSelection(usize),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("walls requested in {0} dimensions, but the cell only has three")]
    TooManyWalls(usize),

    #[error("too many balls for the cell, they will never fit (filling fraction {0})")]
    Overfilled(f64),

    #[error(
        "placement cell size too small: ({:.4}, {:.4}, {:.4}), minimum allowed width {min_width:.4}",
        .cell_width[0], .cell_width[1], .cell_width[2]
    )]
    PlacementCellTooSmall { cell_width: [f64; 3], min_width: f64 },

    #[error("only {spots} lattice sites are available for {n} balls")]
    NotEnoughSites { spots: usize, n: usize },

    #[error("ball {ball} has more than {max} neighbors; the neighbor bound was too low")]
    TooManyNeighbors { ball: usize, max: usize },

    #[error("energy level {level} is outside the table of {levels} levels")]
    EnergyOutOfRange { level: usize, levels: usize },

    #[error("error in initial placement:\n{0}")]
    InvalidPlacement(String),

    #[error("tracked interaction count {tracked} disagrees with recount {actual}")]
    InteractionMismatch { tracked: usize, actual: usize },

    #[error("neighbor table error: {ball} has {neighbor} as a neighbor, but {neighbor} does not reciprocate")]
    NeighborAsymmetry { ball: usize, neighbor: usize },

    #[error("unable to create {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}
