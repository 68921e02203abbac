mod common;

use bfoalign::{
    alignment::Alignment,
    chemotaxis::ChemotaxisEngine,
    control::{AnomalyState, BfoaOptions, IterationOutcome, OptimizationLoop},
    report,
    sequence::SequenceSource,
};
use common::{ScriptedOperator, EVALUATIONS_BEFORE_FAILURE};

fn options(bacteria: usize, iterations: usize) -> BfoaOptions {
    BfoaOptions::builder()
        .num_bacteria(bacteria)
        .num_iterations(iterations)
        .build()
}

#[test]
fn test_every_iteration_failing_yields_no_solution() {
    let operator = ScriptedOperator::new(vec![vec![1.0, 2.0]]).failing(&[0, 1, 2, 3]);
    let mut optimizer = OptimizationLoop::new(options(2, 4), operator).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    assert!(!report.has_solution());
    assert_eq!(report.resets, 4);
    assert_eq!(report.nfe, 4 * EVALUATIONS_BEFORE_FAILURE);
    assert!(report
        .history
        .iter()
        .all(|r| r.outcome == IterationOutcome::Reset));

    let text = report.render();
    assert!(text.contains(report::NO_SOLUTION));
    assert_eq!(report::parse(&text).fields.fitness, None);
    assert_eq!(optimizer.operator().replacements.get(), 0);
}

#[test]
fn test_nfe_sums_evaluations_per_iteration() {
    let operator = ScriptedOperator::new(vec![vec![1.0, 2.0, 3.0]])
        .evaluations_per_iteration(7)
        .failing(&[2]);
    let mut optimizer = OptimizationLoop::new(options(3, 5), operator).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    assert_eq!(report.nfe, 4 * 7 + EVALUATIONS_BEFORE_FAILURE);
    let nfe: Vec<u64> = report.history.iter().map(|r| r.nfe).collect();
    assert!(nfe.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_elite_never_gets_worse() {
    let tables = vec![
        vec![5.0, 1.0],
        vec![3.0, 2.0],
        vec![9.0, 0.0],
        vec![4.0, 4.0],
        vec![-1.0, 8.5],
    ];
    let mut optimizer =
        OptimizationLoop::new(options(2, 5), ScriptedOperator::new(tables)).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    let elite: Vec<f64> = report.history.iter().map(|r| r.elite_fitness).collect();
    assert_eq!(elite, vec![5.0, 5.0, 9.0, 9.0, 9.0]);
    assert_eq!(report.elite.as_ref().unwrap().index, 0);
    assert_eq!(optimizer.operator().replacements.get(), 5);
}

#[test]
fn test_elite_survives_population_reset() {
    let operator = ScriptedOperator::new(vec![vec![8.0, 2.0]]).failing(&[1]);
    let mut optimizer = OptimizationLoop::new(options(2, 3), operator).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    assert_eq!(report.history[1].outcome, IterationOutcome::Reset);
    assert_eq!(report.history[1].elite_fitness, 8.0);
    assert_eq!(report.elite.unwrap().fitness, 8.0);
}

#[test]
fn test_anomaly_is_corrected_from_input_sequences() {
    let operator = ScriptedOperator::new(vec![vec![10.0, 150.0, 20.0]]).single_score(Some(40.0));
    let mut optimizer = OptimizationLoop::new(options(3, 1), operator).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    match report.history[0].outcome {
        IterationOutcome::Scored {
            best_index,
            best_fitness,
            state,
            working_fitness,
            elite_updated,
        } => {
            assert_eq!(best_index, 1);
            assert_eq!(best_fitness, 150.0);
            assert_eq!(state, AnomalyState::Corrected);
            assert_eq!(working_fitness, 40.0);
            assert!(elite_updated);
        }
        other => panic!("Expected a scored iteration, got {:?}", other),
    }

    let sequences = common::source().load().unwrap();
    let elite = report.elite.unwrap();
    assert_eq!(elite.fitness, 40.0);
    assert_eq!(elite.index, 1);
    assert_eq!(elite.alignment, Alignment::from_sequences(sequences.sequences()));
    assert_eq!(report.corrections, 1);
    assert_eq!(report.discards, 0);
}

#[test]
fn test_failed_repair_discards_cell() {
    let operator = ScriptedOperator::new(vec![vec![10.0, 150.0]]).single_score(None);
    let mut optimizer = OptimizationLoop::new(options(2, 1), operator).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    match report.history[0].outcome {
        IterationOutcome::Scored {
            state,
            working_fitness,
            elite_updated,
            ..
        } => {
            assert_eq!(state, AnomalyState::Discarded);
            assert_eq!(working_fitness, 0.0);
            assert!(!elite_updated);
        }
        other => panic!("Expected a scored iteration, got {:?}", other),
    }
    assert!(!report.has_solution());
    assert_eq!(report.discards, 1);
}

#[test]
fn test_still_anomalous_repair_is_discarded() {
    let operator = ScriptedOperator::new(vec![vec![150.0, 1.0]]).single_score(Some(120.0));
    let mut optimizer = OptimizationLoop::new(options(2, 1), operator).unwrap();
    let report = optimizer.run(&common::source()).unwrap();
    assert_eq!(report.discards, 1);
    assert_eq!(report.corrections, 0);
}

#[test]
fn test_step_follows_cooling_and_damping() {
    let options = BfoaOptions::builder()
        .num_bacteria(1)
        .num_iterations(5)
        .initial_step(300.0)
        .anomaly_threshold(2000.0)
        .build();
    let operator = ScriptedOperator::new(vec![vec![1000.0]]);
    let mut optimizer = OptimizationLoop::new(options, operator).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    assert_eq!(report.history[0].step, 300);
    let expected = (300.0 * 0.5_f64.powf(1.0 / 5.0) * 0.5) as usize;
    assert_eq!(report.history[1].step, expected);
    assert!(report.history.iter().all(|r| (5..=300).contains(&r.step)));
}

#[test]
fn test_default_engine_keeps_population_square() {
    let options = BfoaOptions::builder()
        .num_bacteria(5)
        .num_iterations(4)
        .initial_step(12.0)
        .step_floor(2.0)
        .anomaly_threshold(1.0e9)
        .build();
    let mut optimizer = OptimizationLoop::new(options, ChemotaxisEngine::with_seed(23)).unwrap();
    let report = optimizer.run(&common::source()).unwrap();

    assert_eq!(report.history.len(), 4);
    assert_eq!(report.resets, 0);
    let elite = report.elite.expect("a valid elite");
    assert_eq!(elite.alignment.num_rows(), 3);
    assert!(elite.alignment.is_square());
}
