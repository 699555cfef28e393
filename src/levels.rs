/// Per energy level bookkeeping updated after every attempted move.
///
/// An energy level is the number of interacting pairs. The table holds the
/// visitation histogram used by the adaptive weight methods, the walker
/// direction counters of the optimized ensemble, and the round trip counts.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyLevels {
    /// Visits to each level since the last reset
    pub visits: Vec<u64>,
    /// Visits made while heading from the max-entropy state toward the most
    /// interactions observed
    pub walkers_up: Vec<u64>,
    /// Visits counted by the walker bookkeeping
    pub walkers_total: Vec<u64>,
    /// Completed round trips through each level
    pub round_trips: Vec<u64>,
    /// Level reached since the last visit to the max-entropy state
    seeking: Vec<bool>,
    /// Range of levels with `seeking` set
    seeking_range: Option<(usize, usize)>,
    /// Whether the max-entropy state has been seen since the last reset
    anchored: bool,
    /// Direction of the walker
    heading_up: bool,
}

impl EnergyLevels {
    pub fn new(energy_levels: usize) -> Self {
        EnergyLevels {
            visits: vec![0; energy_levels],
            walkers_up: vec![0; energy_levels],
            walkers_total: vec![0; energy_levels],
            round_trips: vec![0; energy_levels],
            seeking: vec![false; energy_levels],
            seeking_range: None,
            anchored: false,
            heading_up: false,
        }
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Record the system sitting at `level` after a move attempt.
    ///
    /// `max_entropy` and `max_interactions` are the two turning points of
    /// the walker.
    pub fn record(&mut self, level: usize, max_entropy: usize, max_interactions: usize) {
        self.visits[level] += 1;

        if level >= max_interactions {
            self.heading_up = false;
        } else if level <= max_entropy {
            self.heading_up = true;
        }
        self.walkers_total[level] += 1;
        if self.heading_up {
            self.walkers_up[level] += 1;
        }

        self.track_round_trip(level, max_entropy);
    }

    fn track_round_trip(&mut self, level: usize, max_entropy: usize) {
        if level == max_entropy {
            if let Some((lo, hi)) = self.seeking_range.take() {
                for e in lo..=hi {
                    if self.seeking[e] {
                        self.seeking[e] = false;
                        self.round_trips[e] += 1;
                    }
                }
            }
            self.anchored = true;
        } else if self.anchored && !self.seeking[level] {
            self.seeking[level] = true;
            self.seeking_range = Some(match self.seeking_range {
                Some((lo, hi)) => (lo.min(level), hi.max(level)),
                None => (level, level),
            });
        }
    }

    pub fn total_visits(&self) -> u64 {
        self.visits.iter().sum()
    }

    /// Lowest and highest level with any visits
    pub fn visited_range(&self) -> Option<(usize, usize)> {
        let lo = self.visits.iter().position(|&v| v > 0)?;
        let hi = self.visits.iter().rposition(|&v| v > 0)?;
        Some((lo, hi))
    }

    pub fn reset_visits(&mut self) {
        self.visits.fill(0);
    }

    pub fn reset_walkers(&mut self) {
        self.walkers_up.fill(0);
        self.walkers_total.fill(0);
    }

    /// Clear the round trip counts and forget any trip in progress
    pub fn reset_round_trips(&mut self) {
        self.round_trips.fill(0);
        self.seeking.fill(false);
        self.seeking_range = None;
        self.anchored = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(levels: &mut EnergyLevels, path: &[usize], max_entropy: usize, max_interactions: usize) {
        for &e in path {
            levels.record(e, max_entropy, max_interactions);
        }
    }

    #[test]
    fn test_round_trips_count_once_per_cycle() {
        let mut levels = EnergyLevels::new(20);
        // max entropy at 5, boundary at 9
        let cycle = [5, 6, 7, 8, 9, 9, 8, 7, 6, 5];
        walk(&mut levels, &cycle, 5, 12);
        assert_eq!(levels.round_trips[9], 1);
        walk(&mut levels, &cycle, 5, 12);
        assert_eq!(levels.round_trips[9], 2);
        assert_eq!(levels.round_trips[7], 2);
        assert_eq!(levels.round_trips[5], 0);
    }

    #[test]
    fn test_round_trip_needs_a_return() {
        let mut levels = EnergyLevels::new(20);
        walk(&mut levels, &[5, 6, 7, 8, 9, 8, 9, 8], 5, 12);
        assert_eq!(levels.round_trips[9], 0);
        walk(&mut levels, &[7, 6, 5], 5, 12);
        assert_eq!(levels.round_trips[9], 1);
    }

    #[test]
    fn test_round_trips_ignore_levels_before_max_entropy_is_seen() {
        let mut levels = EnergyLevels::new(20);
        walk(&mut levels, &[9, 8, 7, 6, 5, 6, 5], 5, 12);
        assert_eq!(levels.round_trips[9], 0);
        assert_eq!(levels.round_trips[6], 1);
    }

    #[test]
    fn test_walker_direction() {
        let mut levels = EnergyLevels::new(20);
        walk(&mut levels, &[3, 4, 5, 6, 7, 6, 5, 4, 3], 3, 7);
        // heading up from 3 until 7 is reached, then heading down
        assert_eq!(levels.walkers_up[5], 1);
        assert_eq!(levels.walkers_total[5], 2);
        assert_eq!(levels.walkers_up[7], 0);
        assert_eq!(levels.walkers_up[3], 2);
        assert_eq!(levels.visited_range(), Some((3, 7)));
        assert_eq!(levels.total_visits(), 9);
    }
}
