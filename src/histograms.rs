//! Histograms accumulated once per sweep during production, each
//! conditioned on the energy level the system sits at.

use std::f64::consts::PI;

use crate::error::SimError;
use crate::simulation::Simulation;

/// Bin widths of the spatial histograms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramParams {
    /// Radial bin width of the pair distribution
    pub de_g: f64,
    /// Largest radius of the pair distribution
    pub max_rdf_radius: f64,
    /// Slab width of the density profile
    pub de_density: f64,
}

impl Default for HistogramParams {
    fn default() -> Self {
        HistogramParams {
            de_g: 0.05,
            max_rdf_radius: 10.0,
            de_density: 0.1,
        }
    }
}

/// The spatial histogram kept for the cell: pair distribution for a fully
/// periodic cell, density profile along x when there are walls
#[derive(Debug, Clone, PartialEq)]
pub enum Spatial {
    Rdf {
        de_g: f64,
        counts: Vec<Vec<u64>>,
        /// Sweeps that contributed to each level's row
        samples: Vec<u64>,
    },
    Density {
        de_density: f64,
        counts: Vec<Vec<u64>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histograms {
    /// Sweeps spent at each energy level
    pub energy: Vec<u64>,
    pub spatial: Spatial,
}

impl Histograms {
    pub fn new(sim: &Simulation, params: &HistogramParams) -> Result<Self, SimError> {
        let levels = sim.energy_levels;
        let spatial = if sim.cell.walls == 0 {
            if params.de_g <= 0.0 || params.max_rdf_radius <= 0.0 {
                return Err(SimError::invalid("de_g", "RDF bin width and radius must be positive"));
            }
            let reach = sim.cell.min_length().min(params.max_rdf_radius);
            let bins = (reach / params.de_g / 2.0).round() as usize;
            if bins == 0 {
                return Err(SimError::invalid("de_g", "RDF bin width exceeds half the cell"));
            }
            Spatial::Rdf {
                de_g: params.de_g,
                counts: vec![vec![0; bins]; levels],
                samples: vec![0; levels],
            }
        } else {
            if params.de_density <= 0.0 {
                return Err(SimError::invalid("de_density", "density bin width must be positive"));
            }
            let bins = ((sim.cell.lengths.x / params.de_density).round() as usize).max(1);
            Spatial::Density {
                de_density: params.de_density,
                counts: vec![vec![0; bins]; levels],
            }
        };
        Ok(Histograms {
            energy: vec![0; levels],
            spatial,
        })
    }

    /// Add the current configuration of `sim`
    pub fn record(&mut self, sim: &Simulation) {
        let e = sim.interactions;
        self.energy[e] += 1;
        match &mut self.spatial {
            Spatial::Rdf {
                de_g,
                counts,
                samples,
            } => {
                samples[e] += 1;
                let row = &mut counts[e];
                let bins = row.len();
                for (i, a) in sim.balls.iter().enumerate() {
                    for (j, b) in sim.balls.iter().enumerate() {
                        if i == j {
                            continue;
                        }
                        let bin = (sim.cell.distance(&a.pos, &b.pos) / *de_g).floor() as usize;
                        if bin < bins {
                            row[bin] += 1;
                        }
                    }
                }
            }
            Spatial::Density { de_density, counts } => {
                let row = &mut counts[e];
                let last = row.len() - 1;
                for ball in &sim.balls {
                    let bin = (ball.pos.x / *de_density).floor().max(0.0) as usize;
                    row[bin.min(last)] += 1;
                }
            }
        }
    }

    /// Number of sweeps recorded
    pub fn total(&self) -> u64 {
        self.energy.iter().sum()
    }

    /// Pair distribution g(r) at level `e`, one value per radial bin centered
    /// on `(bin + 0.5)·de_g`, or `None` without RDF data at that level
    pub fn pair_distribution(&self, e: usize, n: usize, volume: f64) -> Option<Vec<f64>> {
        let Spatial::Rdf {
            de_g,
            counts,
            samples,
        } = &self.spatial
        else {
            return None;
        };
        if samples[e] == 0 {
            return None;
        }
        let density = n as f64 / volume;
        let row = counts[e]
            .iter()
            .enumerate()
            .map(|(bin, &count)| {
                let probability = count as f64 / samples[e] as f64;
                let r = (bin as f64 + 0.5) * de_g;
                let shell = 4.0 / 3.0 * PI * ((r + de_g / 2.0).powi(3) - (r - de_g / 2.0).powi(3));
                probability / volume / shell / (density * density)
            })
            .collect();
        Some(row)
    }

    /// Number density in each slab along x at level `e`, given the slab
    /// cross section, or `None` if the level was never recorded
    pub fn density_profile(&self, e: usize, cross_section: f64) -> Option<Vec<f64>> {
        let Spatial::Density { de_density, counts } = &self.spatial else {
            return None;
        };
        if self.energy[e] == 0 {
            return None;
        }
        let bin_volume = de_density * cross_section;
        let row = counts[e]
            .iter()
            .map(|&count| count as f64 / self.energy[e] as f64 / bin_volume)
            .collect();
        Some(row)
    }
}
