//! Batch evaluation over prime lists.
//!
//! Each prime is processed end to end on its own (model, simulation,
//! prediction), so the work is spread with rayon and reassembled in input
//! order.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::constants::{COSMIC_FREQUENCY, HBAR};
use crate::error::{OscillatorError, Result};
use crate::model::OscillatorModel;
use crate::prediction::StrategyKind;
use crate::simulation::simulate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub current: u64,
    pub actual_next: u64,
    pub predicted_next: u64,
    pub is_correct: bool,
    pub gap_error: u64,
    pub confidence: f64,
    pub fell_back: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub strategy: StrategyKind,
    pub predictions: Vec<PredictionRecord>,
    pub total_tests: usize,
    pub correct_predictions: usize,
    /// Fraction in [0, 1].
    pub accuracy: f64,
    pub average_confidence: f64,
    pub average_gap_error: f64,
    pub fallbacks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimePhysics {
    pub prime: u64,
    pub inductance: f64,
    pub capacitance: f64,
    pub resistance: f64,
    pub quality_factor: f64,
    pub damping_factor: f64,
    /// Mean energy of a 2-period run over ħ·f₀, twice its ratio to the
    /// zero-point energy.
    pub energy_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub gaps: Vec<u64>,
    /// Gap size to number of occurrences.
    pub gap_frequencies: BTreeMap<u64, usize>,
    pub physics: Vec<PrimePhysics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantumRatioEntry {
    pub prime: u64,
    pub quantum_energy: f64,
    pub ratio_calculated: f64,
    pub ratio_theoretical: f64,
    pub error_percentage: f64,
}

/// Predict the successor of every prime but the last and score each guess
/// against the following list entry.
pub fn evaluate_accuracy(
    primes: &[u64],
    kind: StrategyKind,
    config: &EngineConfig,
) -> Result<AccuracyReport> {
    if primes.len() < 2 {
        return Err(OscillatorError::InvalidInput(format!(
            "accuracy evaluation needs at least two primes, got {}",
            primes.len()
        )));
    }

    let strategy = config.strategy(kind);
    let predictions = primes
        .par_windows(2)
        .map(|pair| -> Result<PredictionRecord> {
            let (current, actual_next) = (pair[0], pair[1]);
            let model = config.model(current)?;
            let result = strategy.predict(&model)?;
            Ok(PredictionRecord {
                current,
                actual_next,
                predicted_next: result.predicted_next,
                is_correct: result.predicted_next == actual_next,
                gap_error: result.predicted_next.abs_diff(actual_next),
                confidence: result.confidence,
                fell_back: result.fell_back,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let total_tests = predictions.len();
    let n = total_tests as f64;
    let correct_predictions = predictions.iter().filter(|r| r.is_correct).count();
    let report = AccuracyReport {
        strategy: kind,
        total_tests,
        correct_predictions,
        accuracy: correct_predictions as f64 / n,
        average_confidence: predictions.iter().map(|r| r.confidence).sum::<f64>() / n,
        average_gap_error: predictions.iter().map(|r| r.gap_error as f64).sum::<f64>() / n,
        fallbacks: predictions.iter().filter(|r| r.fell_back).count(),
        predictions,
    };

    log::info!(
        "{} strategy: {}/{} correct ({:.1}%), {} fallbacks",
        kind,
        report.correct_predictions,
        report.total_tests,
        report.accuracy * 100.0,
        report.fallbacks
    );
    Ok(report)
}

/// Gap statistics and per-prime physical parameters.
pub fn analyze_patterns(primes: &[u64], config: &EngineConfig) -> Result<PatternReport> {
    let gaps = prime_core::prime_gaps(primes);
    let mut gap_frequencies = BTreeMap::new();
    for &gap in &gaps {
        *gap_frequencies.entry(gap).or_insert(0) += 1;
    }

    let options = config.simulation.clone().with_periods(2.0);
    let physics = primes
        .par_iter()
        .map(|&prime| -> Result<PrimePhysics> {
            let model = config.model(prime)?;
            let sim = simulate(&model, &options)?;
            Ok(PrimePhysics {
                prime,
                inductance: model.inductance,
                capacitance: model.capacitance,
                resistance: model.resistance,
                quality_factor: model.quality_factor,
                damping_factor: model.damping_factor,
                energy_ratio: sim.mean_energy / (HBAR * COSMIC_FREQUENCY),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!(
        "analyzed {} primes, {} distinct gaps",
        physics.len(),
        gap_frequencies.len()
    );
    Ok(PatternReport {
        gaps,
        gap_frequencies,
        physics,
    })
}

/// Compare each prime's quantum energy ratio with 16πp.
pub fn quantum_ratio_check(primes: &[u64]) -> Result<Vec<QuantumRatioEntry>> {
    primes
        .iter()
        .map(|&prime| -> Result<QuantumRatioEntry> {
            let model = OscillatorModel::for_prime(prime)?;
            Ok(QuantumRatioEntry {
                prime,
                quantum_energy: model.quantum_energy,
                ratio_calculated: model.quantum_ratio,
                ratio_theoretical: model.theoretical_quantum_ratio,
                error_percentage: model.quantum_ratio_error_percentage(),
            })
        })
        .collect()
}
