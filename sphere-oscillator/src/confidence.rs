//! Advisory confidence score for a prediction.
//!
//! Four factors, each clamped to [0, 1], are averaged and the mean is clamped
//! to [0.1, 1]:
//!
//! - size: min(1, 20/p)
//! - quality: min(1, Q/10)
//! - damping: max(0.1, 1 − γ)
//! - a fourth factor chosen by [`ConfidenceBasis`]
//!
//! The score never influences which candidate a strategy returns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OscillatorError, Result};
use crate::model::OscillatorModel;

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Source of the fourth confidence factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBasis {
    /// max(0.1, 1 − resonance error)
    #[default]
    Resonance,
    /// min(1, (mean energy / zero-point energy) / 100)
    EnergyRatio,
}

impl fmt::Display for ConfidenceBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceBasis::Resonance => write!(f, "resonance"),
            ConfidenceBasis::EnergyRatio => write!(f, "energy_ratio"),
        }
    }
}

impl std::str::FromStr for ConfidenceBasis {
    type Err = OscillatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "resonance" => Ok(ConfidenceBasis::Resonance),
            "energy_ratio" | "energy-ratio" => Ok(ConfidenceBasis::EnergyRatio),
            other => Err(OscillatorError::InvalidInput(format!(
                "unknown confidence basis '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub basis: ConfidenceBasis,
    pub size_factor: f64,
    pub quality_factor: f64,
    pub damping_factor: f64,
    pub basis_factor: f64,
    pub confidence: f64,
}

fn unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Score a model. `mean_energy` is only read by the energy-ratio basis.
pub fn confidence_breakdown(
    model: &OscillatorModel,
    basis: ConfidenceBasis,
    mean_energy: f64,
) -> ConfidenceBreakdown {
    let size_factor = unit(20.0 / model.prime as f64);
    let quality_factor = unit(model.quality_factor / 10.0);
    let damping_factor = unit((1.0 - model.damping_factor).max(0.1));
    let basis_factor = match basis {
        ConfidenceBasis::Resonance => unit((1.0 - model.resonance_error).max(0.1)),
        ConfidenceBasis::EnergyRatio => unit(mean_energy / model.zero_point_energy / 100.0),
    };

    let mean = (size_factor + quality_factor + damping_factor + basis_factor) / 4.0;
    ConfidenceBreakdown {
        basis,
        size_factor,
        quality_factor,
        damping_factor,
        basis_factor,
        confidence: mean.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
    }
}

pub fn estimate_confidence(
    model: &OscillatorModel,
    basis: ConfidenceBasis,
    mean_energy: f64,
) -> f64 {
    confidence_breakdown(model, basis, mean_energy).confidence
}
