//! Initialization phases and the production loop.

use std::time::{Duration, Instant};
use tracing::info;

use crate::error::SimError;
use crate::histograms::Histograms;
use crate::simulation::Simulation;
use crate::weights::WeightStrategy;

/// Wall clock schedule for checkpoint writes. The period starts at one
/// second and doubles after every write, up to half an hour.
#[derive(Debug, Clone)]
pub struct CheckpointSchedule {
    period: Duration,
    max_period: Duration,
    last: Instant,
}

impl CheckpointSchedule {
    pub fn new(start: Instant) -> Self {
        Self::with_periods(start, Duration::from_secs(1), Duration::from_secs(30 * 60))
    }

    pub fn with_periods(start: Instant, period: Duration, max_period: Duration) -> Self {
        CheckpointSchedule {
            period,
            max_period,
            last: start,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a checkpoint is due at `now`; if so the schedule advances
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) <= self.period {
            return false;
        }
        self.last = now;
        if self.period < self.max_period / 2 {
            self.period *= 2;
        } else if self.period < self.max_period {
            self.period = self.max_period;
        }
        true
    }
}

/// Settings of the production loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionOptions {
    /// Sweeps to run
    pub iterations: u64,
    /// Sweeps between progress reports, if any
    pub report_interval: Option<u64>,
}

/// Prepare `sim` and `weights` for production: settle into the most
/// probable state, let the weights initialize, settle again under the new
/// weights, and clear the statistics gathered so far
pub fn initialize<W: WeightStrategy + ?Sized>(
    sim: &mut Simulation,
    weights: &mut W,
) -> Result<(), SimError> {
    sim.initialize_max_entropy_and_translation_distance(weights)?;
    info!("Initializing {} weights", weights.tag());
    weights.initialize(sim)?;
    sim.initialize_max_entropy_and_translation_distance(weights)?;
    sim.reset_statistics();
    Ok(())
}

/// Run exactly `options.iterations` sweeps, recording `histograms` after
/// each one. `checkpoint` is called on the wall clock schedule and once more
/// at the end.
pub fn production<W, C>(
    sim: &mut Simulation,
    weights: &mut W,
    histograms: &mut Histograms,
    options: &ProductionOptions,
    mut checkpoint: C,
) -> Result<(), SimError>
where
    W: WeightStrategy + ?Sized,
    C: FnMut(&Simulation, &Histograms) -> Result<(), SimError>,
{
    let started = Instant::now();
    let mut schedule = CheckpointSchedule::new(started);
    while sim.iteration < options.iterations {
        sim.sweep(weights)?;
        histograms.record(sim);

        if schedule.due(Instant::now()) {
            info!(
                "Saving data after {}, {} iterations complete.",
                format_elapsed(started.elapsed()),
                sim.iteration
            );
            checkpoint(sim, histograms)?;
        }
        if let Some(interval) = options.report_interval {
            if interval > 0 && sim.iteration % interval == 0 {
                log_progress(sim);
            }
        }
    }
    info!("Production finished after {}", format_elapsed(started.elapsed()));
    checkpoint(sim, histograms)
}

/// `days, HH:MM:SS` for a duration
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{} days, {:02}:{:02}:{:02}",
        secs / 86_400,
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

/// Neighbor table statistics for a progress report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborStats {
    pub average: f64,
    pub most: usize,
    /// Distance evaluations with tables as a fraction of those without
    pub work_fraction: f64,
}

pub fn neighbor_stats(sim: &Simulation) -> NeighborStats {
    let n = sim.n();
    let total: usize = sim.balls.iter().map(|b| b.num_neighbors()).sum();
    let most = sim.balls.iter().map(|b| b.num_neighbors()).max().unwrap_or(0);
    let average = total as f64 / n as f64;
    let without = sim.moves.total as f64 * n as f64;
    let with = sim.moves.total as f64 * average + (n as u64 * sim.moves.updates) as f64;
    NeighborStats {
        average,
        most,
        work_fraction: if without > 0.0 { with / without } else { 0.0 },
    }
}

/// Log the acceptance rate and the neighbor table statistics
pub fn log_progress(sim: &Simulation) {
    let moves = sim.moves;
    info!(
        "Iteration {}, acceptance rate of {:.4}, translation_distance: {:.5}.",
        sim.iteration,
        moves.acceptance_rate(),
        sim.translation_distance
    );
    if moves.total > 0 {
        let per_update = if moves.updates > 0 {
            moves.informs as f64 / moves.updates as f64
        } else {
            0.0
        };
        info!(
            "We've had {:.3} updates per kilomove and {:.3} informs per kilomove, for {:.3} informs per update.",
            1000.0 * moves.updates as f64 / moves.total as f64,
            1000.0 * moves.informs as f64 / moves.total as f64,
            per_update
        );
    }
    let stats = neighbor_stats(sim);
    info!(
        "We've done about {:.3}% of the distance calculations we would have done without tables.",
        100.0 * stats.work_fraction
    );
    info!(
        "The max number of neighbors is {}, whereas the most we have is {}. Average is {:.2}.",
        sim.neighbors.max_neighbors, stats.most, stats.average
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histograms::HistogramParams;
    use crate::simulation::SimParams;
    use crate::weights::Unweighted;

    #[test]
    fn test_checkpoint_period_doubles_up_to_the_cap() {
        let start = Instant::now();
        let mut schedule = CheckpointSchedule::new(start);
        assert!(!schedule.due(start + Duration::from_millis(500)));

        let mut now = start;
        let mut periods = Vec::new();
        for _ in 0..14 {
            now += schedule.period() + Duration::from_millis(1);
            assert!(schedule.due(now));
            periods.push(schedule.period().as_secs());
        }
        assert_eq!(&periods[..4], &[2, 4, 8, 16]);
        assert_eq!(periods[9], 1024);
        assert_eq!(periods[10], 1800);
        assert_eq!(periods[13], 1800);
    }

    #[test]
    fn test_checkpoint_waits_a_full_period() {
        let start = Instant::now();
        let mut schedule = CheckpointSchedule::new(start);
        assert!(schedule.due(start + Duration::from_millis(1500)));
        assert!(!schedule.due(start + Duration::from_millis(3000)));
        assert!(schedule.due(start + Duration::from_millis(3600)));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(90_061)), "1 days, 01:01:01");
    }

    #[test]
    fn test_production_runs_requested_sweeps_and_checkpoints_at_end() {
        let params = SimParams {
            n: 8,
            lengths: [10.0, 10.0, 10.0],
            seed: 11,
            ..SimParams::default()
        };
        let mut sim = Simulation::new(&params).unwrap();
        let mut weights = Unweighted::new(sim.energy_levels);
        let mut histograms = Histograms::new(&sim, &HistogramParams::default()).unwrap();
        let options = ProductionOptions {
            iterations: 30,
            report_interval: Some(10),
        };
        let mut writes = 0;
        production(&mut sim, &mut weights, &mut histograms, &options, |sim, hist| {
            writes += 1;
            assert_eq!(hist.total(), sim.iteration);
            Ok(())
        })
        .unwrap();
        assert_eq!(sim.iteration, 30);
        assert_eq!(histograms.total(), 30);
        assert!(writes >= 1);
    }

    #[test]
    fn test_neighbor_stats() {
        let params = SimParams {
            n: 8,
            lengths: [10.0, 10.0, 10.0],
            ..SimParams::default()
        };
        let sim = Simulation::new(&params).unwrap();
        let stats = neighbor_stats(&sim);
        assert!(stats.most <= sim.neighbors.max_neighbors);
        assert!(stats.average <= stats.most as f64);
        assert_eq!(stats.work_fraction, 0.0);
    }
}
