use super::*;
use crate::lattice::cell_lengths_for_filling_fraction;
use crate::weights::{Canonical, Unweighted};
use approx::assert_relative_eq;

fn params(n: usize, ff: f64, walls: usize) -> SimParams {
    SimParams {
        n,
        lengths: cell_lengths_for_filling_fraction(n, 1.0, ff),
        walls,
        seed: 42,
        ..SimParams::default()
    }
}

#[test]
fn test_new_builds_a_valid_system() {
    let sim = Simulation::new(&params(32, 0.3, 0)).unwrap();
    assert_eq!(sim.n(), 32);
    assert_relative_eq!(sim.filling_fraction(), 0.3, epsilon = 1e-12);
    assert!((0..32).all(|i| sim.in_cell(i) && !sim.overlaps(i)));
    assert!(sim.verify_interactions().is_ok());
    assert!(sim.check_neighbor_symmetry().is_ok());
    // 32 balls, 34 within reach of the well of each
    assert_eq!(sim.energy_levels, 32 * 34 / 2 + 1);
    assert_eq!(sim.neighbors.max_neighbors, 31);
}

#[test]
fn test_sweeps_keep_interactions_and_neighbors_consistent() {
    for walls in [0, 1, 3] {
        let mut sim = Simulation::new(&params(32, 0.3, walls)).unwrap();
        let mut weights = Unweighted::new(sim.energy_levels);
        sim.translation_distance = 0.5;
        for _ in 0..50 {
            sim.sweep(&mut weights).unwrap();
            sim.verify_interactions().unwrap();
            sim.check_neighbor_symmetry().unwrap();
        }
        assert!((0..sim.n()).all(|i| sim.in_cell(i) && !sim.overlaps(i)));
        assert!(sim.moves.working > 0);
        assert!(sim.moves.updates > 0);
    }
}

#[test]
fn test_sweep_counts_moves_and_iterations() {
    let mut sim = Simulation::new(&params(32, 0.3, 0)).unwrap();
    let mut weights = Unweighted::new(sim.energy_levels);
    for _ in 0..3 {
        sim.sweep(&mut weights).unwrap();
    }
    assert_eq!(sim.moves.total, 96);
    assert_eq!(sim.iteration, 3);
    assert_eq!(sim.levels.total_visits(), 96);
}

#[test]
fn test_rejected_moves_leave_state_untouched() {
    let mut sim = Simulation::new(&params(32, 0.4, 0)).unwrap();
    let mut weights = Canonical::new(sim.energy_levels, 0.05);
    sim.translation_distance = 0.7;
    let mut refused = 0;
    for _ in 0..3000 {
        let balls = sim.balls.clone();
        let interactions = sim.interactions;
        let outcome = sim.move_a_ball(&mut weights).unwrap();
        if outcome != MoveOutcome::Accepted {
            refused += 1;
            assert_eq!(sim.balls, balls);
            assert_eq!(sim.interactions, interactions);
        }
    }
    assert!(refused > 0);
    sim.verify_interactions().unwrap();
}

#[test]
fn test_tune_translation_distance() {
    let mut sim = Simulation::new(&params(32, 0.3, 0)).unwrap();
    sim.translation_distance = 1.0;
    sim.tune_translation_distance(80, 100);
    assert_relative_eq!(sim.translation_distance, 2.0);
    sim.tune_translation_distance(10, 100);
    assert_relative_eq!(sim.translation_distance, 1.0);
    sim.tune_translation_distance(1000, 1000);
    sim.tune_translation_distance(1000, 1000);
    assert_relative_eq!(sim.translation_distance, sim.cell.min_length() / 2.0);
}

#[test]
fn test_acceptance_rate_converges_to_goal() {
    let p = SimParams {
        tune_period: 20,
        min_search_sweeps: 400,
        max_search_sweeps: 400,
        ..params(32, 0.3, 0)
    };
    let mut sim = Simulation::new(&p).unwrap();
    let mut weights = Unweighted::new(sim.energy_levels);
    sim.initialize_max_entropy_and_translation_distance(&mut weights)
        .unwrap();

    let before = sim.moves;
    for _ in 0..200 {
        sim.sweep(&mut weights).unwrap();
    }
    let rate = (sim.moves.working - before.working) as f64 / (sim.moves.total - before.total) as f64;
    assert!((rate - p.acceptance_goal).abs() < 0.05, "acceptance rate {}", rate);
}

#[test]
fn test_reset_statistics() {
    let mut sim = Simulation::new(&params(32, 0.3, 0)).unwrap();
    let mut weights = Unweighted::new(sim.energy_levels);
    sim.sweep(&mut weights).unwrap();
    sim.reset_statistics();
    assert_eq!(sim.moves, MoveStats::default());
    assert_eq!(sim.iteration, 0);
    assert_eq!(sim.levels.total_visits(), 0);
}

#[test]
fn test_invalid_parameters() {
    let p = SimParams {
        walls: 4,
        ..params(32, 0.3, 0)
    };
    assert!(matches!(p.validate(), Err(SimError::TooManyWalls(4))));

    let p = SimParams {
        well_width: 0.9,
        ..params(32, 0.3, 0)
    };
    assert!(matches!(p.validate(), Err(SimError::InvalidParameter { .. })));

    let p = SimParams {
        neighbor_scale: 0.1,
        ..params(32, 0.3, 0)
    };
    assert!(matches!(
        p.validate(),
        Err(SimError::InvalidParameter {
            name: "neighbor_scale",
            ..
        })
    ));

    let p = SimParams {
        lengths: [5.0, 5.0, 5.0],
        ..params(1000, 0.3, 0)
    };
    assert!(matches!(p.validate(), Err(SimError::Overfilled(_))));
}

#[test]
fn test_overlapping_positions_are_reported() {
    let p = SimParams {
        n: 3,
        lengths: [10.0, 10.0, 10.0],
        walls: 1,
        ..SimParams::default()
    };
    let positions = vec![
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(2.0, 1.0, 1.0),
        Vector3::new(-1.0, 5.0, 5.0),
    ];
    match Simulation::with_positions(&p, positions) {
        Err(SimError::InvalidPlacement(report)) => {
            assert!(report.contains("ball 1 overlaps ball 0"));
            assert!(report.contains("ball 2"));
        }
        other => panic!("expected a placement error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_interactions_counted_from_positions() {
    let p = SimParams {
        n: 3,
        lengths: [10.0, 10.0, 10.0],
        well_width: 1.5,
        ..SimParams::default()
    };
    let positions = vec![
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(3.5, 1.0, 1.0),
        Vector3::new(6.0, 1.0, 1.0),
    ];
    let sim = Simulation::with_positions(&p, positions).unwrap();
    // well reaches 3.0: nearest pairs interact, the outer pair does not
    assert_eq!(sim.interactions, 2);
    assert_eq!(sim.neighbor_count(1), 2);
}
