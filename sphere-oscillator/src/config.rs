//! Engine configuration, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceBasis;
use crate::error::{OscillatorError, Result};
use crate::model::{ModelVariant, OscillatorModel};
use crate::prediction::{
    Basic, Differential, Enhanced, PredictionStrategy, StrategyKind, DEFAULT_MAX_ATTEMPTS,
};
use crate::simulation::SimulationOptions;

/// Settings shared by the CLI and the batch helpers. Missing JSON keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub radius: f64,
    pub charge: f64,
    pub variant: ModelVariant,
    pub simulation: SimulationOptions,
    /// Candidate budget of the enhanced strategy.
    pub max_attempts: u32,
    pub confidence_basis: ConfidenceBasis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            charge: 1.0,
            variant: ModelVariant::default(),
            simulation: SimulationOptions::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            confidence_basis: ConfidenceBasis::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OscillatorError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text).map_err(|e| match e {
            OscillatorError::Config(msg) => {
                OscillatorError::Config(format!("{}: {}", path.as_ref().display(), msg))
            }
            other => other,
        })
    }

    /// Model for `prime` with this config's radius, charge and variant.
    pub fn model(&self, prime: u64) -> Result<OscillatorModel> {
        OscillatorModel::with_variant(prime, self.radius, self.charge, self.variant)
    }

    /// Strategy of the given kind carrying this config's simulation options
    /// and attempt budget. Both simulating strategies score with the
    /// configured confidence basis. The differential strategy keeps its
    /// 2-period span unless an explicit duration is set.
    pub fn strategy(&self, kind: StrategyKind) -> Box<dyn PredictionStrategy> {
        match kind {
            StrategyKind::Basic => Box::new(Basic),
            StrategyKind::Enhanced => Box::new(Enhanced {
                simulation: self.simulation.clone(),
                max_attempts: self.max_attempts,
                basis: self.confidence_basis,
            }),
            StrategyKind::Differential => Box::new(Differential {
                simulation: self.simulation.clone().with_periods(2.0),
                basis: self.confidence_basis,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.radius, 1.0);
        assert_eq!(config.charge, 1.0);
        assert_eq!(config.variant, ModelVariant::SelfConsistent);
        assert_eq!(config.simulation.sample_count, 1000);
        assert_eq!(config.simulation.periods, 3.0);
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.confidence_basis, ConfidenceBasis::Resonance);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{"radius": 2.0, "variant": "independent", "simulation": {"sample_count": 200}}"#,
        )
        .unwrap();
        assert_eq!(config.radius, 2.0);
        assert_eq!(config.charge, 1.0);
        assert_eq!(config.variant, ModelVariant::Independent);
        assert_eq!(config.simulation.sample_count, 200);
        assert_eq!(config.simulation.rtol, 1e-8);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"charge": 0.5, "max_attempts": 5, "confidence_basis": "energy_ratio"}}"#
        )
        .unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.charge, 0.5);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.confidence_basis, ConfidenceBasis::EnergyRatio);

        let model = config.model(7).unwrap();
        assert_eq!(model.charge, 0.5);
    }

    #[test]
    fn test_bad_json_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(file.path()),
            Err(OscillatorError::Config(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(dir.path().join("missing.json")),
            Err(OscillatorError::Io(_))
        ));
    }

    #[test]
    fn test_strategy_uses_config() {
        let config = EngineConfig {
            max_attempts: 3,
            ..EngineConfig::default()
        };
        for kind in StrategyKind::ALL {
            assert_eq!(config.strategy(kind).kind(), kind);
        }
        let model = config.model(1327).unwrap();
        let r = config.strategy(StrategyKind::Enhanced).predict(&model).unwrap();
        assert!(r.fell_back);
        assert_eq!(r.attempts, 3);
    }

    #[test]
    fn test_confidence_basis_reaches_both_simulating_strategies() {
        let model = OscillatorModel::for_prime(11).unwrap();
        for basis in [ConfidenceBasis::Resonance, ConfidenceBasis::EnergyRatio] {
            let config = EngineConfig {
                confidence_basis: basis,
                ..EngineConfig::default()
            };
            for kind in [StrategyKind::Enhanced, StrategyKind::Differential] {
                let r = config.strategy(kind).predict(&model).unwrap();
                assert_eq!(r.confidence_breakdown.unwrap().basis, basis, "{}", kind);
            }
        }

        // The unconfigured differential strategy scores like the default config.
        let r = Differential::default().predict(&model).unwrap();
        assert_eq!(r.confidence_breakdown.unwrap().basis, ConfidenceBasis::default());
    }
}
