// ─────────────────────────────────────────────────────────────────────
// Equilibria — End-to-End Scenarios
// ─────────────────────────────────────────────────────────────────────
//! Whole-engine behaviour through the public facade, including the
//! statistical properties that need many samples.

use num_complex::Complex64;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    Candidate, Engine, EngineConfig, EngineError, Phase, StateVector, Superposition, WarningKind,
};

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap()
}

#[test]
fn test_scenario_trajectory_approaches_equilibrium() {
    let engine = engine();
    let initial = engine.new_state(Some(vec![0.5, 0.4, 0.6, 0.7])).unwrap();
    let traj = engine.integrate(&initial, (0.0, 10.0), 11).unwrap();
    let samples: Vec<(f64, StateVector)> = traj.iter().map(|r| r.unwrap()).collect();
    assert_eq!(samples.len(), 11);
    let (t_last, last) = samples.last().unwrap();
    assert_eq!(*t_last, 10.0);
    assert!(
        last.distance_to_equilibrium() < initial.distance_to_equilibrium(),
        "d0={} d10={}",
        initial.distance_to_equilibrium(),
        last.distance_to_equilibrium()
    );
}

#[test]
fn test_scenario_phase_labels() {
    let engine = engine();
    let low = engine.new_state(Some(vec![0.2, 0.2, 0.95, 0.25])).unwrap();
    let high = engine.new_state(Some(vec![0.85, 0.90, 0.80, 0.95])).unwrap();
    assert_eq!(engine.classify(&low), Phase::Collapsing);
    assert_eq!(engine.classify(&high), Phase::Growing);
}

#[test]
fn test_scenario_empty_collapse() {
    let engine = engine();
    assert_eq!(
        engine.collapse_seeded(&[], 1).unwrap_err(),
        EngineError::EmptyCandidateSet
    );
}

#[test]
fn test_boundedness_random_long_runs() {
    let engine = engine();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for _ in 0..20 {
        let initial = StateVector::random(engine.refs(), &mut rng);
        let traj = engine.integrate(&initial, (0.0, 200.0), 401).unwrap();
        for item in &traj {
            let (t, s) = item.unwrap();
            for (i, &v) in s.values().iter().enumerate() {
                assert!((0.0..=1.0).contains(&v), "t={t}: component {i} = {v}");
            }
        }
    }
}

#[test]
fn test_harmony_exact_at_equilibrium() {
    let engine = engine();
    assert_eq!(engine.new_state(None).unwrap().harmony(), 1.0);
}

#[test]
fn test_optimizer_weak_monotonicity() {
    let engine = engine();
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut total = 0usize;
    let mut held = 0usize;
    for _ in 0..200 {
        let start = StateVector::random(engine.refs(), &mut rng);
        let run = engine.optimizer().run(&start, 5).unwrap();
        for rec in &run.history {
            total += 1;
            if rec.objective_after >= rec.objective_before - 1e-9 {
                held += 1;
            }
        }
    }
    assert!(total >= 900, "only {total} generations recorded");
    let share = held as f64 / total as f64;
    assert!(share >= 0.95, "only {held}/{total} generations held the objective");
}

#[test]
fn test_optimize_history_serialises() {
    let engine = engine();
    let start = engine.new_state(Some(vec![0.4, 0.5, 0.3, 0.6])).unwrap();
    let run = engine.optimize(&start).unwrap();
    assert!(!run.history.is_empty());
    let json = serde_json::to_string(&run.history).unwrap();
    assert!(json.contains("objective_after"));
}

#[test]
fn test_collective_run_reproducible() {
    let engine = engine();
    let agents = |seed| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..10)
            .map(|_| StateVector::random(engine.refs(), &mut rng))
            .collect::<Vec<_>>()
    };
    let a = engine.run_collective(agents(4), 12).unwrap();
    let b = engine.run_collective(agents(4), 12).unwrap();
    assert_eq!(a, b);
    for rec in &a.metrics {
        assert!(rec.synchrony > 0.0 && rec.synchrony <= 1.0);
    }
}

#[test]
fn test_collective_keeps_integration_warnings() {
    let engine = Engine::from_json(r#"{ "collective": { "integration_dt": 50.0 } }"#).unwrap();
    let edge = engine.new_state(Some(vec![0.0, 1.0, 0.0, 1.0])).unwrap();
    let (_, direct) = engine.step(&edge, 50.0).unwrap();
    assert!(!direct.is_empty());

    let run = engine.run_collective(vec![edge.clone(), edge], 1).unwrap();
    let clamps = run.metrics[0]
        .warnings
        .iter()
        .filter(|w| w.warning.kind == WarningKind::Clamped)
        .count();
    assert!(
        clamps >= 2 * direct.len(),
        "{clamps} clamps for {} per agent",
        direct.len()
    );
    let json = serde_json::to_string(&run.metrics).unwrap();
    assert!(json.contains("clamped"), "{json}");
}

#[test]
fn test_optimizer_warning_limit_from_config() {
    let engine = Engine::from_json(r#"{ "optimizer": { "warning_limit": 0 } }"#).unwrap();
    let eq = engine.new_state(None).unwrap();
    assert!(matches!(
        engine.optimize(&eq),
        Err(EngineError::WarningLimitExceeded { count: 1, limit: 0 })
    ));
    assert!(matches!(
        engine.run_collective(vec![eq.clone(), eq], 3),
        Err(EngineError::WarningLimitExceeded { limit: 0, .. })
    ));
}

#[test]
fn test_collapse_distribution() {
    let engine = engine();
    let s = engine.new_state(Some(vec![0.6, 0.6, 0.6, 0.6])).unwrap();
    let candidates = vec![
        Candidate::new(s.clone(), Complex64::new(0.6, 0.0)),
        Candidate::new(s, Complex64::new(0.0, 0.8)),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(31337);
    let draws = 100_000;
    let first = (0..draws)
        .filter(|_| engine.collapse(&candidates, &mut rng).unwrap().index == 0)
        .count();
    let p0 = first as f64 / draws as f64;
    assert!((p0 - 0.36).abs() < 0.01, "p0={p0}");
    assert!((1.0 - p0 - 0.64).abs() < 0.01, "p1={}", 1.0 - p0);
}

#[test]
fn test_collapse_deterministic_given_seed() {
    let engine = engine();
    let r = engine.refs();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let candidates: Vec<Candidate> = (0..6)
        .map(|k| {
            let state = StateVector::random(r, &mut rng);
            Candidate::new(state, Complex64::new(1.0, k as f64))
        })
        .collect();
    let sp = Superposition::new(candidates.clone()).unwrap();
    let a = sp.clone().collapse_seeded(123).unwrap();
    let b = sp.collapse_seeded(123).unwrap();
    assert_eq!(a, b);
    assert_eq!(engine.collapse_seeded(&candidates, 123).unwrap().index, a.index);
}

#[test]
fn test_tuning_leaves_engine_untouched() {
    let engine = engine();
    let before = engine.system().params().clone();
    let initial = engine.new_state(Some(vec![0.5, 0.4, 0.6, 0.7])).unwrap();
    let tuning = engine.tune_decay_rates(&initial, 3.0, 16, 2).unwrap();
    assert_eq!(engine.system().params(), &before);
    assert_eq!(tuning.parameters.dim(), 4);
}

#[test]
fn test_warning_limit_from_config() {
    let engine = Engine::from_json(r#"{ "integrator": { "warning_limit": 0 } }"#).unwrap();
    let initial = engine.new_state(Some(vec![0.0, 1.0, 0.0, 1.0])).unwrap();
    let traj = engine.integrate(&initial, (0.0, 400.0), 3).unwrap();
    let err = traj.final_state().unwrap_err();
    assert!(matches!(err, EngineError::WarningLimitExceeded { limit: 0, .. }));
}
