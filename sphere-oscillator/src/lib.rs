//! Prime-driven damped oscillator.
//!
//! An integer p fixes the constants of a series RLC circuit
//! ([`model::OscillatorModel`]). The circuit's transient is integrated with an
//! adaptive Dormand–Prince scheme ([`simulation::simulate`]), cross-checked
//! against a closed form ([`analytical`]) and the resonance condition
//! ([`resonance`]), and the resulting energies feed heuristics that guess the
//! prime following p ([`prediction`]).

pub mod analysis;
pub mod analytical;
pub mod confidence;
pub mod config;
pub mod constants;
pub mod energy;
pub mod error;
pub mod integrator;
pub mod model;
pub mod prediction;
pub mod resonance;
pub mod simulation;

pub use analysis::{
    analyze_patterns, evaluate_accuracy, quantum_ratio_check, AccuracyReport, PatternReport,
};
pub use analytical::{
    analytical_solution, analytical_solution_from, compare_solutions, AnalyticalSolution,
    SolutionDeviation,
};
pub use confidence::{estimate_confidence, ConfidenceBasis};
pub use config::EngineConfig;
pub use energy::{aggregate_energy, EnergySummary};
pub use error::{OscillatorError, Result};
pub use integrator::IntegrationError;
pub use model::{build_model, ModelVariant, OscillatorModel};
pub use prediction::{predict_next, PredictionResult, PredictionStrategy, StrategyKind};
pub use resonance::{verify_resonance, ResonanceReport};
pub use simulation::{simulate, SimulationOptions, SimulationResult};

pub use prime_core::{generate_primes, is_prime, next_prime};
