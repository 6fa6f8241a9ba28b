//! Next-prime strategies.
//!
//! Every strategy returns a candidate that is prime. `Basic` scans upward from
//! p + 1 and is the ground truth. `Enhanced` and `Differential` turn simulated
//! quantities into an estimated gap, test a bounded run of candidates from
//! there, and fall back to the exhaustive scan when the run holds no prime.
//! A fallback is reported through [`PredictionResult::fell_back`].
//!
//! The gap estimates truncate scaled floating-point output, so a change of
//! tolerance or step control can move a truncation boundary and change the
//! estimate.

use std::fmt;

use prime_core::{checked_next_prime, is_prime, LARGEST_U64_PRIME};
use serde::{Deserialize, Serialize};

use crate::confidence::{confidence_breakdown, ConfidenceBasis, ConfidenceBreakdown};
use crate::error::{OscillatorError, Result};
use crate::model::OscillatorModel;
use crate::simulation::{simulate, SimulationOptions, SimulationResult};

/// Confidence reported by the exhaustive strategy.
pub const BASIC_CONFIDENCE: f64 = 0.5;

/// Candidates tested by the enhanced strategy before it falls back.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// The differential strategy only tests candidates below p + this.
pub const DIFFERENTIAL_SEARCH_WINDOW: u64 = 20;

/// Available prediction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Basic,
    Enhanced,
    Differential,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Basic,
        StrategyKind::Enhanced,
        StrategyKind::Differential,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Basic => write!(f, "basic"),
            StrategyKind::Enhanced => write!(f, "enhanced"),
            StrategyKind::Differential => write!(f, "differential"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = OscillatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(StrategyKind::Basic),
            "enhanced" => Ok(StrategyKind::Enhanced),
            "differential" => Ok(StrategyKind::Differential),
            other => Err(OscillatorError::InvalidInput(format!(
                "unknown strategy '{}' (expected basic, enhanced or differential)",
                other
            ))),
        }
    }
}

/// Integer corrections that make up the enhanced gap estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapCorrections {
    /// trunc(10·Q) mod 6
    pub quality: u64,
    /// trunc(1000·γ) mod 4
    pub damping: u64,
    /// trunc(10⁶·mean energy) mod 8
    pub energy: u64,
    /// trunc(10⁶·energy std dev) mod 3
    pub stability: u64,
    /// 4, 2 or 6 for p mod 6 = 1, 5 or anything else.
    pub residue_modulus: u64,
    pub estimated_gap: u64,
}

/// Simulated and derived quantities a strategy based its guess on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicalParameters {
    pub quality_factor: f64,
    pub damping_factor: f64,
    pub mean_energy: f64,
    pub energy_std_dev: f64,
    /// Mean energy over the zero-point energy.
    pub energy_ratio: f64,
    pub inductance: f64,
    pub capacitance: f64,
    pub resistance: f64,
    pub natural_frequency: f64,
    pub time_constant: f64,
}

impl PhysicalParameters {
    fn from_run(model: &OscillatorModel, sim: &SimulationResult) -> Self {
        Self {
            quality_factor: model.quality_factor,
            damping_factor: model.damping_factor,
            mean_energy: sim.mean_energy,
            energy_std_dev: sim.energy_std_dev,
            energy_ratio: sim.mean_energy / model.zero_point_energy,
            inductance: model.inductance,
            capacitance: model.capacitance,
            resistance: model.resistance,
            natural_frequency: model.natural_frequency,
            time_constant: model.time_constant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub current_prime: u64,
    pub predicted_next: u64,
    /// predicted_next − current_prime
    pub gap: u64,
    pub confidence: f64,
    pub strategy: StrategyKind,
    /// Candidates tested, counting the fallback scan as the full budget.
    pub attempts: u32,
    /// True when the heuristic search came up empty and the exhaustive scan
    /// produced the answer.
    pub fell_back: bool,
    pub corrections: Option<GapCorrections>,
    pub physical: Option<PhysicalParameters>,
    pub confidence_breakdown: Option<ConfidenceBreakdown>,
}

impl PredictionResult {
    fn exhaustive(prime: u64, strategy: StrategyKind) -> Result<Self> {
        let next = successor(prime)?;
        Ok(Self {
            current_prime: prime,
            predicted_next: next,
            gap: next - prime,
            confidence: BASIC_CONFIDENCE,
            strategy,
            attempts: (next - prime) as u32,
            fell_back: false,
            corrections: None,
            physical: None,
            confidence_breakdown: None,
        })
    }
}

fn no_successor(prime: u64) -> OscillatorError {
    OscillatorError::InvalidInput(format!("no prime above {} is representable as u64", prime))
}

/// Fail before simulating when no prime above `prime` fits in a `u64`.
fn ensure_searchable(prime: u64) -> Result<()> {
    if prime >= LARGEST_U64_PRIME {
        return Err(no_successor(prime));
    }
    Ok(())
}

/// Exhaustive successor of `prime`.
fn successor(prime: u64) -> Result<u64> {
    checked_next_prime(prime).ok_or_else(|| no_successor(prime))
}

/// A way of turning a model into a next-prime guess.
pub trait PredictionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Human-readable name of this strategy.
    fn name(&self) -> String {
        self.kind().to_string()
    }

    fn predict(&self, model: &OscillatorModel) -> Result<PredictionResult>;
}

/// Exhaustive upward scan; always correct.
#[derive(Debug, Clone, Copy, Default)]
pub struct Basic;

impl PredictionStrategy for Basic {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Basic
    }

    fn predict(&self, model: &OscillatorModel) -> Result<PredictionResult> {
        PredictionResult::exhaustive(model.prime, StrategyKind::Basic)
    }
}

/// Gap estimated from Q, γ and the energy statistics of a 3-period run.
#[derive(Debug, Clone)]
pub struct Enhanced {
    pub simulation: SimulationOptions,
    pub max_attempts: u32,
    pub basis: ConfidenceBasis,
}

impl Default for Enhanced {
    fn default() -> Self {
        Self {
            simulation: SimulationOptions::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            basis: ConfidenceBasis::default(),
        }
    }
}

impl PredictionStrategy for Enhanced {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Enhanced
    }

    fn predict(&self, model: &OscillatorModel) -> Result<PredictionResult> {
        let p = model.prime;
        ensure_searchable(p)?;
        let sim = simulate(model, &self.simulation)?;
        let physical = PhysicalParameters::from_run(model, &sim);
        let corrections = gap_corrections(
            p,
            model.quality_factor,
            model.damping_factor,
            sim.mean_energy,
            sim.energy_std_dev,
        );

        let start = p.checked_add(corrections.estimated_gap).ok_or_else(|| {
            OscillatorError::InvalidInput(format!("prime {} too large to search past", p))
        })?;
        let limit = start.saturating_add(self.max_attempts as u64);
        let (predicted_next, attempts, fell_back) = match scan(start, limit) {
            Some((candidate, tested)) => (candidate, tested, false),
            None => {
                log::warn!(
                    "enhanced: no prime in [{}, {}) for p={}, falling back to exhaustive search",
                    start,
                    limit,
                    p
                );
                (successor(p)?, self.max_attempts, true)
            }
        };

        let breakdown = confidence_breakdown(model, self.basis, sim.mean_energy);
        Ok(PredictionResult {
            current_prime: p,
            predicted_next,
            gap: predicted_next - p,
            confidence: breakdown.confidence,
            strategy: StrategyKind::Enhanced,
            attempts,
            fell_back,
            corrections: Some(corrections),
            physical: Some(physical),
            confidence_breakdown: Some(breakdown),
        })
    }
}

/// Gap estimated from the mean-energy-to-frequency ratio of a 2-period run.
#[derive(Debug, Clone)]
pub struct Differential {
    pub simulation: SimulationOptions,
    pub basis: ConfidenceBasis,
}

impl Default for Differential {
    fn default() -> Self {
        Self {
            simulation: SimulationOptions::default().with_periods(2.0),
            basis: ConfidenceBasis::default(),
        }
    }
}

impl PredictionStrategy for Differential {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Differential
    }

    fn predict(&self, model: &OscillatorModel) -> Result<PredictionResult> {
        let p = model.prime;
        ensure_searchable(p)?;
        let sim = simulate(model, &self.simulation)?;
        let ratio = sim.mean_energy / model.frequency;
        let estimated_gap = 2 + truncated_residue(ratio, 1e6, 6);

        let limit = p.checked_add(DIFFERENTIAL_SEARCH_WINDOW).ok_or_else(|| {
            OscillatorError::InvalidInput(format!("prime {} too large to search past", p))
        })?;
        let start = p + estimated_gap;
        let budget = (limit - start) as u32;
        let (predicted_next, attempts, fell_back) = match scan(start, limit) {
            Some((candidate, tested)) => (candidate, tested, false),
            None => {
                log::warn!(
                    "differential: no prime in [{}, {}) for p={}, falling back to exhaustive scan",
                    start,
                    limit,
                    p
                );
                (successor(p)?, budget, true)
            }
        };

        let breakdown = confidence_breakdown(model, self.basis, sim.mean_energy);
        Ok(PredictionResult {
            current_prime: p,
            predicted_next,
            gap: predicted_next - p,
            confidence: breakdown.confidence,
            strategy: StrategyKind::Differential,
            attempts,
            fell_back,
            corrections: None,
            physical: Some(PhysicalParameters::from_run(model, &sim)),
            confidence_breakdown: Some(breakdown),
        })
    }
}

/// First prime in `[start, limit)` and how many candidates were tested.
fn scan(start: u64, limit: u64) -> Option<(u64, u32)> {
    (start..limit)
        .position(is_prime)
        .map(|i| (start + i as u64, i as u32 + 1))
}

/// trunc(value·scale) reduced to [0, modulus). Non-finite input maps to 0.
pub fn truncated_residue(value: f64, scale: f64, modulus: u64) -> u64 {
    let scaled = (value * scale).trunc();
    if !scaled.is_finite() {
        return 0;
    }
    scaled.rem_euclid(modulus as f64) as u64
}

/// Modulus applied to the enhanced gap sum, keyed on p mod 6.
pub fn residue_modulus(prime: u64) -> u64 {
    match prime % 6 {
        1 => 4,
        5 => 2,
        _ => 6,
    }
}

/// Combine the four corrections into an estimated gap of at least 2.
pub fn gap_corrections(
    prime: u64,
    quality_factor: f64,
    damping_factor: f64,
    mean_energy: f64,
    energy_std_dev: f64,
) -> GapCorrections {
    let quality = truncated_residue(quality_factor, 10.0, 6);
    let damping = truncated_residue(damping_factor, 1000.0, 4);
    let energy = truncated_residue(mean_energy, 1e6, 8);
    let stability = truncated_residue(energy_std_dev, 1e6, 3);
    let residue_modulus = residue_modulus(prime);
    let estimated_gap = ((2 + quality + damping + energy + stability) % residue_modulus).max(2);

    GapCorrections {
        quality,
        damping,
        energy,
        stability,
        residue_modulus,
        estimated_gap,
    }
}

/// Default-configured strategy for `kind`.
pub fn strategy(kind: StrategyKind) -> Box<dyn PredictionStrategy> {
    match kind {
        StrategyKind::Basic => Box::new(Basic),
        StrategyKind::Enhanced => Box::new(Enhanced::default()),
        StrategyKind::Differential => Box::new(Differential::default()),
    }
}

/// Predict with the default configuration of `kind`.
pub fn predict_next(model: &OscillatorModel, kind: StrategyKind) -> Result<PredictionResult> {
    strategy(kind).predict(model)
}
