//! Closed-form damped-oscillator solution, used only to cross-check the
//! integrator.

use std::fmt;

use serde::Serialize;

use crate::error::{OscillatorError, Result};
use crate::model::OscillatorModel;
use crate::simulation::SimulationResult;

/// Damping regime selected by comparing γ² with ω₀².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingRegime {
    Underdamped,
    /// γ² ≥ ω₀². The formula used here is an approximation, not the exact
    /// critically or overdamped solution.
    CriticalOrOverdamped,
}

impl fmt::Display for DampingRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DampingRegime::Underdamped => write!(f, "underdamped"),
            DampingRegime::CriticalOrOverdamped => write!(f, "critical/overdamped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticalSolution {
    pub time: Vec<f64>,
    pub charge: Vec<f64>,
    pub current: Vec<f64>,
    pub voltage: Vec<f64>,
    pub damping_factor: f64,
    pub natural_frequency: f64,
    /// ωd when underdamped, otherwise ω₀.
    pub damped_frequency: f64,
    pub regime: DampingRegime,
}

/// Maximum and RMS deviations between an analytical and a numerical run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolutionDeviation {
    pub max_charge_error: f64,
    pub max_current_error: f64,
    pub rms_charge_error: f64,
}

/// Evaluate the closed form at `times`, starting from the model's charge
/// amplitude.
pub fn analytical_solution(model: &OscillatorModel, times: &[f64]) -> AnalyticalSolution {
    analytical_solution_from(model, times, model.charge_amplitude)
}

/// Evaluate the closed form at `times` with Q(0) = `q0`. Pass
/// `SimulationOptions::initial_charge_for` to match a simulation run.
pub fn analytical_solution_from(
    model: &OscillatorModel,
    times: &[f64],
    q0: f64,
) -> AnalyticalSolution {
    let gamma = model.resistance / (2.0 * model.inductance);
    let omega0_sq = 1.0 / (model.inductance * model.capacitance);
    let omega0 = omega0_sq.sqrt();

    let (regime, omega) = if gamma * gamma < omega0_sq {
        (DampingRegime::Underdamped, (omega0_sq - gamma * gamma).sqrt())
    } else {
        (DampingRegime::CriticalOrOverdamped, omega0)
    };

    let mut charge = Vec::with_capacity(times.len());
    let mut current = Vec::with_capacity(times.len());
    for &t in times {
        let decay = q0 * (-gamma * t).exp();
        let (sin, cos) = (omega * t).sin_cos();
        charge.push(decay * cos);
        current.push(match regime {
            DampingRegime::Underdamped => decay * (-gamma * cos - omega * sin),
            DampingRegime::CriticalOrOverdamped => -gamma * decay * cos,
        });
    }
    let voltage = charge.iter().map(|q| q / model.capacitance).collect();

    AnalyticalSolution {
        time: times.to_vec(),
        charge,
        current,
        voltage,
        damping_factor: gamma,
        natural_frequency: omega0,
        damped_frequency: omega,
        regime,
    }
}

/// Compare the two solutions sample by sample.
pub fn compare_solutions(
    analytical: &AnalyticalSolution,
    simulation: &SimulationResult,
) -> Result<SolutionDeviation> {
    let n = analytical.charge.len();
    if n != simulation.charge.len()
        || n != simulation.current.len()
        || n != analytical.current.len()
    {
        return Err(OscillatorError::InvalidInput(format!(
            "sample count mismatch: analytical has {}, simulation has {}",
            n,
            simulation.charge.len()
        )));
    }
    if n == 0 {
        return Err(OscillatorError::InvalidInput("no samples to compare".into()));
    }

    let mut max_charge_error = 0.0f64;
    let mut max_current_error = 0.0f64;
    let mut sum_sq = 0.0;
    for i in 0..n {
        let dq = (analytical.charge[i] - simulation.charge[i]).abs();
        let di = (analytical.current[i] - simulation.current[i]).abs();
        max_charge_error = max_charge_error.max(dq);
        max_current_error = max_current_error.max(di);
        sum_sq += dq * dq;
    }

    Ok(SolutionDeviation {
        max_charge_error,
        max_current_error,
        rms_charge_error: (sum_sq / n as f64).sqrt(),
    })
}
