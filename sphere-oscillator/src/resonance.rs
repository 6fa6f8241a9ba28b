//! Resonance check: LC against 1/(4p²) and ω₀ against 2p.

use serde::Serialize;

use crate::model::OscillatorModel;

/// Both error percentages must fall below this for a model to count as
/// resonant.
pub const RESONANCE_TOLERANCE_PERCENT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResonanceReport {
    pub lc_calculated: f64,
    pub lc_theoretical: f64,
    pub error_percentage: f64,
    pub natural_frequency: f64,
    pub expected_frequency: f64,
    pub frequency_error_percentage: f64,
    pub valid: bool,
}

pub fn verify_resonance(model: &OscillatorModel) -> ResonanceReport {
    let p = model.prime as f64;
    let lc_theoretical = 1.0 / (4.0 * p * p);
    let lc_calculated = model.inductance * model.capacitance;
    let error_percentage = (lc_calculated - lc_theoretical).abs() / lc_theoretical * 100.0;

    let expected_frequency = 2.0 * p;
    let natural_frequency = 1.0 / lc_calculated.sqrt();
    let frequency_error_percentage =
        (natural_frequency - expected_frequency).abs() / expected_frequency * 100.0;

    ResonanceReport {
        lc_calculated,
        lc_theoretical,
        error_percentage,
        natural_frequency,
        expected_frequency,
        frequency_error_percentage,
        valid: error_percentage < RESONANCE_TOLERANCE_PERCENT
            && frequency_error_percentage < RESONANCE_TOLERANCE_PERCENT,
    }
}
