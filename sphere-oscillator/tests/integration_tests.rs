use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sphere_oscillator::prediction::{Basic, Enhanced, PredictionStrategy};
use sphere_oscillator::{
    build_model, evaluate_accuracy, generate_primes, is_prime, next_prime, predict_next, simulate,
    verify_resonance, EngineConfig, ModelVariant, OscillatorError, OscillatorModel,
    SimulationOptions, StrategyKind,
};

#[test]
fn test_primality_examples() {
    for n in [0u64, 1] {
        assert!(!is_prime(n));
    }
    assert!(is_prime(2));
    assert!(!is_prime(9));
    assert!(is_prime(97));
    assert_eq!(generate_primes(5, 5), vec![5, 7, 11, 13, 17]);
}

#[test]
fn test_basic_prediction_examples() {
    let r = predict_next(&build_model(7, 1.0, 1.0).unwrap(), StrategyKind::Basic).unwrap();
    assert_eq!(r.predicted_next, 11);
    assert_eq!(r.gap, 4);

    let r = predict_next(&build_model(13, 1.0, 1.0).unwrap(), StrategyKind::Basic).unwrap();
    assert_eq!(r.predicted_next, 17);
    assert_eq!(r.gap, 4);
}

#[test]
fn test_basic_matches_next_prime_on_random_primes() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let p = next_prime(rng.gen_range(2..1_000_000u64));
        let model = OscillatorModel::for_prime(p).unwrap();
        let r = Basic.predict(&model).unwrap();
        assert_eq!(r.predicted_next, next_prime(p));
        assert_eq!(r.confidence, 0.5);
    }
}

#[test]
fn test_resonance_holds_for_generated_primes() {
    for p in generate_primes(2, 100) {
        let model = build_model(p, 1.0, 1.0).unwrap();
        assert!(model.resonance_error < 1e-9, "p={}", p);
        assert!(verify_resonance(&model).valid, "p={}", p);
    }
}

#[test]
fn test_resonance_with_random_geometry() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let p = next_prime(rng.gen_range(2..10_000u64));
        let radius = rng.gen_range(0.1..10.0);
        let charge = rng.gen_range(0.1..10.0);
        let model = build_model(p, radius, charge).unwrap();
        assert!(model.resonance_error < 1e-9);

        let variant = ModelVariant::Independent;
        let a = OscillatorModel::with_variant(p, radius, charge, variant).unwrap();
        let b = OscillatorModel::with_variant(p, radius, charge, variant).unwrap();
        assert_eq!(a.resonance_error.to_bits(), b.resonance_error.to_bits());
    }
}

#[test]
fn test_undamped_limit_conserves_energy() {
    let model = build_model(7, 1.0, 1.0).unwrap().with_resistance(0.0).unwrap();
    let sim = simulate(&model, &SimulationOptions::default()).unwrap();
    let e0 = sim.total_energy[0];
    let worst = sim
        .total_energy
        .iter()
        .map(|e| ((e - e0) / e0).abs())
        .fold(0.0, f64::max);
    assert!(worst < 1e-6, "relative energy drift {}", worst);
    assert!(sim.energy_std_dev / sim.mean_energy < 1e-6);
}

#[test]
fn test_enhanced_gap_and_confidence_bounds() {
    for p in generate_primes(2, 40) {
        let model = build_model(p, 1.0, 1.0).unwrap();
        for kind in StrategyKind::ALL {
            let r = predict_next(&model, kind).unwrap();
            assert!(r.gap >= 2 || (p == 2 && r.gap == 1), "p={} {} gap={}", p, kind, r.gap);
            assert!(is_prime(r.predicted_next), "p={} {} gave {}", p, kind, r.predicted_next);
            assert!(
                (0.1..=1.0).contains(&r.confidence),
                "p={} {} confidence {}",
                p,
                kind,
                r.confidence
            );
        }
    }
}

#[test]
fn test_enhanced_fallback_is_flagged_and_correct() {
    // 1327 and 1361 bound a gap of 34.
    let model = build_model(1327, 1.0, 1.0).unwrap();
    let r = Enhanced::default().predict(&model).unwrap();
    assert!(r.fell_back);
    assert_eq!(r.predicted_next, 1361);
    assert_eq!(r.attempts, 20);
}

#[test]
fn test_batch_accuracy_scenario() {
    let primes = [5, 7, 11, 13, 17, 19, 23];
    let config = EngineConfig::default();

    let basic = evaluate_accuracy(&primes, StrategyKind::Basic, &config).unwrap();
    assert_eq!(basic.accuracy, 1.0);
    assert_eq!(basic.correct_predictions, basic.total_tests);

    let enhanced = evaluate_accuracy(&primes, StrategyKind::Enhanced, &config).unwrap();
    assert_eq!(enhanced.total_tests, 6);
    assert!((0.0..=1.0).contains(&enhanced.accuracy));
    assert_eq!(
        enhanced.correct_predictions,
        enhanced.predictions.iter().filter(|r| r.is_correct).count()
    );
    println!(
        "enhanced accuracy over {:?}: {:.1}%",
        primes,
        enhanced.accuracy * 100.0
    );
}

#[test]
fn test_non_prime_input_is_flagged() {
    let model = build_model(15, 1.0, 1.0).unwrap();
    assert!(!model.is_prime_input);
    let r = predict_next(&model, StrategyKind::Basic).unwrap();
    assert_eq!(r.predicted_next, 17);
}

#[test]
fn test_input_without_successor_is_rejected() {
    let model = build_model(u64::MAX, 1.0, 1.0).unwrap();
    assert!(!model.is_prime_input);
    for kind in StrategyKind::ALL {
        let err = predict_next(&model, kind).unwrap_err();
        assert!(
            matches!(err, OscillatorError::InvalidInput(_)),
            "{}: {}",
            kind,
            err
        );
    }
    assert!(generate_primes(u64::MAX, 3).is_empty());
}

#[test]
fn test_report_values_serialize() {
    let model = build_model(11, 1.0, 1.0).unwrap();
    let r = predict_next(&model, StrategyKind::Enhanced).unwrap();
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["strategy"], "enhanced");
    assert_eq!(json["current_prime"], 11);
    assert!(json["physical"]["mean_energy"].is_number());

    let json = serde_json::to_value(&model).unwrap();
    assert_eq!(json["variant"], "self_consistent");
}
