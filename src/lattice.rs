//! Initial placement of balls on a face centered cubic lattice, and sizing
//! of the cell for a requested filling fraction.

use itertools::iproduct;
use nalgebra::Vector3;
use rand::seq::index::sample;
use rand::Rng;
use std::f64::consts::{PI, SQRT_2};
use tracing::info;

use crate::error::SimError;
use crate::geometry::Cell;

/// Lattice sites in each fcc unit cell
pub const SPOTS_PER_CELL: usize = 4;

/// Smallest fcc unit cell in which touching balls of `radius` do not overlap
pub fn min_cell_width(radius: f64) -> f64 {
    2.0 * SQRT_2 * radius
}

/// Cell lengths giving `n` balls of `radius` the filling fraction `ff`.
///
/// A cubic cell is used when it leaves room for enough fcc unit cells.
/// Otherwise the cell is made lopsided: the z length is just large enough
/// for the unit cells stacked along it, and x and y share the remaining
/// volume.
pub fn cell_lengths_for_filling_fraction(n: usize, radius: f64, ff: f64) -> [f64; 3] {
    let volume = 4.0 * PI / 3.0 * radius.powi(3) * n as f64 / ff;
    let min_width = min_cell_width(radius);
    let numcells = n.div_ceil(SPOTS_PER_CELL);
    let max_cubic_width = (volume / min_width.powi(3)).cbrt().floor() as usize;
    if max_cubic_width.pow(3) > numcells {
        let l = volume.cbrt();
        return [l, l, l];
    }

    let xcells = ((numcells as f64).cbrt() + 1e-9).floor().max(1.0) as usize;
    let cellsleft = numcells.div_ceil(xcells);
    let ycells = ((cellsleft as f64).sqrt() + 1e-9).floor().max(1.0) as usize;
    let zcells = cellsleft.div_ceil(ycells);
    info!(
        "Using lopsided {} x {} x {} cell (total goal {})",
        xcells, ycells, zcells, numcells
    );

    let lz = zcells as f64 * min_width;
    if xcells == ycells {
        let lxy = (volume / lz).sqrt();
        [lxy, lxy, lz]
    } else {
        let ly = min_width * ycells as f64;
        [volume / ly / lz, ly, lz]
    }
}

/// Place `n` balls on an fcc lattice stretched to fill `cell`, leaving a
/// random selection of sites vacant
pub fn place_on_fcc<R: Rng>(
    n: usize,
    radius: f64,
    cell: &Cell,
    rng: &mut R,
) -> Result<Vec<Vector3<f64>>, SimError> {
    let min_width = min_cell_width(radius);
    let cells: [usize; 3] = std::array::from_fn(|k| (cell.lengths[k] / min_width).floor() as usize);
    let width: [f64; 3] = std::array::from_fn(|k| cell.lengths[k] / cells[k] as f64);
    if cells.iter().any(|&c| c == 0) || width.iter().any(|&w| w < min_width) {
        return Err(SimError::PlacementCellTooSmall {
            cell_width: width,
            min_width,
        });
    }

    let offsets = [
        Vector3::zeros(),
        Vector3::new(0.0, width[1], width[2]) / 2.0,
        Vector3::new(width[0], 0.0, width[2]) / 2.0,
        Vector3::new(width[0], width[1], 0.0) / 2.0,
    ];

    let total_spots = SPOTS_PER_CELL * cells[0] * cells[1] * cells[2];
    if total_spots < n {
        return Err(SimError::NotEnoughSites {
            spots: total_spots,
            n,
        });
    }
    let mut reserved = vec![false; total_spots];
    for spot in sample(rng, total_spots, total_spots - n).iter() {
        reserved[spot] = true;
    }

    let sites = iproduct!(0..cells[0], 0..cells[1], 0..cells[2], 0..SPOTS_PER_CELL);
    let positions: Vec<Vector3<f64>> = sites
        .zip(reserved)
        .filter(|&(_, vacant)| !vacant)
        .map(|((i, j, k, l), _)| {
            Vector3::new(
                i as f64 * width[0],
                j as f64 * width[1],
                k as f64 * width[2],
            ) + offsets[l]
        })
        .collect();
    Ok(positions)
}
