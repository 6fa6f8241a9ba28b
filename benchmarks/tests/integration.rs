//! Cross-crate checks: every strategy against prime-core's ground truth.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use prime_core::{next_prime, sieve_primes};
use sphere_oscillator::{
    analytical_solution, analyze_patterns, compare_solutions, evaluate_accuracy, simulate,
    EngineConfig, OscillatorModel, SimulationOptions, StrategyKind,
};

#[test]
fn test_strategies_return_primes_above_input() {
    let config = EngineConfig::default();
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..10 {
        let p = next_prime(rng.gen_range(100..100_000u64));
        let model = config.model(p).unwrap();
        for kind in StrategyKind::ALL {
            let r = config.strategy(kind).predict(&model).unwrap();
            assert!(r.predicted_next > p);
            assert!(prime_core::is_prime(r.predicted_next));
            // Only the heuristic search can skip past the true successor.
            if kind == StrategyKind::Basic || r.fell_back {
                assert_eq!(r.predicted_next, next_prime(p));
            }
        }
    }
}

#[test]
fn test_basic_accuracy_over_sieved_primes() {
    let primes = sieve_primes(500);
    let report = evaluate_accuracy(&primes, StrategyKind::Basic, &EngineConfig::default()).unwrap();
    assert_eq!(report.total_tests, primes.len() - 1);
    assert_eq!(report.accuracy, 1.0);
}

#[test]
fn test_enhanced_accuracy_is_reported() {
    let primes = sieve_primes(200);
    let report =
        evaluate_accuracy(&primes, StrategyKind::Enhanced, &EngineConfig::default()).unwrap();
    assert_eq!(report.total_tests, primes.len() - 1);
    assert!(report.average_confidence >= 0.1 && report.average_confidence <= 1.0);
    println!(
        "enhanced: {}/{} correct, {} fallbacks",
        report.correct_predictions, report.total_tests, report.fallbacks
    );
}

#[test]
fn test_pattern_gaps_match_prime_core() {
    let primes = sieve_primes(100);
    let report = analyze_patterns(&primes, &EngineConfig::default()).unwrap();
    assert_eq!(report.gaps, prime_core::prime_gaps(&primes));
    let counted: usize = report.gap_frequencies.values().sum();
    assert_eq!(counted, primes.len() - 1);
}

#[test]
fn test_analytical_cross_check_on_lightly_damped_model() {
    let model = OscillatorModel::new(211, 1.0, 0.01).unwrap();
    let sim = simulate(&model, &SimulationOptions::default()).unwrap();
    let solution = analytical_solution(&model, &sim.time);
    let dev = compare_solutions(&solution, &sim).unwrap();
    assert!(dev.max_charge_error < 0.02 * model.charge_amplitude);
}
