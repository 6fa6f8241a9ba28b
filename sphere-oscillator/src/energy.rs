//! Energy bookkeeping for a simulated trajectory.

use serde::Serialize;

use crate::model::OscillatorModel;
use crate::simulation::SimulationResult;

/// Per-sample energies: ½LI², ½Q²/C and their sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySeries {
    pub inductor: Vec<f64>,
    pub capacitor: Vec<f64>,
    pub total: Vec<f64>,
}

/// Mean and population standard deviation of the total energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergySummary {
    pub mean_energy: f64,
    pub energy_std_dev: f64,
}

/// Energies for parallel charge/current series.
pub fn energy_series(
    charge: &[f64],
    current: &[f64],
    inductance: f64,
    capacitance: f64,
) -> EnergySeries {
    let inductor: Vec<f64> = current.iter().map(|i| 0.5 * inductance * i * i).collect();
    let capacitor: Vec<f64> = charge.iter().map(|q| 0.5 * q * q / capacitance).collect();
    let total = inductor.iter().zip(&capacitor).map(|(l, c)| l + c).collect();
    EnergySeries {
        inductor,
        capacitor,
        total,
    }
}

/// Mean and population standard deviation; both zero for an empty series.
pub fn summarize(total_energy: &[f64]) -> EnergySummary {
    if total_energy.is_empty() {
        return EnergySummary {
            mean_energy: 0.0,
            energy_std_dev: 0.0,
        };
    }
    let n = total_energy.len() as f64;
    let mean = total_energy.iter().sum::<f64>() / n;
    let variance = total_energy.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    EnergySummary {
        mean_energy: mean,
        energy_std_dev: variance.sqrt(),
    }
}

/// Recompute the energy aggregates of a simulation from its Q and I series
/// and the model's L and C.
pub fn aggregate_energy(result: &SimulationResult, model: &OscillatorModel) -> EnergySummary {
    let series = energy_series(
        &result.charge,
        &result.current,
        model.inductance,
        model.capacitance,
    );
    summarize(&series.total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_series() {
        let s = energy_series(&[2.0, 0.0], &[0.0, 3.0], 2.0, 0.5);
        assert_eq!(s.capacitor, vec![4.0, 0.0]);
        assert_eq!(s.inductor, vec![0.0, 9.0]);
        assert_eq!(s.total, vec![4.0, 9.0]);
    }

    #[test]
    fn test_summary_uses_population_std() {
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.mean_energy, 5.0);
        assert_eq!(s.energy_std_dev, 2.0);
    }

    #[test]
    fn test_summary_of_empty_and_constant() {
        assert_eq!(summarize(&[]).mean_energy, 0.0);
        let s = summarize(&[1.5; 10]);
        assert_eq!(s.mean_energy, 1.5);
        assert_eq!(s.energy_std_dev, 0.0);
    }
}
