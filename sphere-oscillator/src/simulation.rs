//! Transient simulation of the oscillator ODE.
//!
//! L·Q'' + R·Q' + Q/C = 0 is integrated as the first-order system
//! [Q, I]' = [I, −(R/L)·I − Q/(LC)] from Q(0) = Q₀, I(0) = 0 and sampled on
//! an evenly spaced grid.

use serde::{Deserialize, Serialize};

use crate::energy::{energy_series, summarize};
use crate::error::{OscillatorError, Result};
use crate::integrator::{
    DormandPrince, IntegrationStats, OdeSystem, Tolerances, DEFAULT_MAX_STEPS,
};
use crate::model::OscillatorModel;

/// Knobs for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Span in seconds; when absent the span is `periods` model periods.
    pub duration: Option<f64>,
    pub periods: f64,
    pub sample_count: usize,
    /// Q(0); defaults to the model's charge amplitude.
    pub initial_charge: Option<f64>,
    pub rtol: f64,
    pub atol: f64,
    /// Ceiling on integrator step attempts.
    pub max_steps: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        let tol = Tolerances::default();
        Self {
            duration: None,
            periods: 3.0,
            sample_count: 1000,
            initial_charge: None,
            rtol: tol.rtol,
            atol: tol.atol,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl SimulationOptions {
    pub fn with_periods(mut self, periods: f64) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_initial_charge(mut self, initial_charge: f64) -> Self {
        self.initial_charge = Some(initial_charge);
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Span in seconds for the given model.
    pub fn span(&self, model: &OscillatorModel) -> f64 {
        self.duration.unwrap_or(self.periods * model.period)
    }

    /// Q(0) a run of `model` starts from.
    pub fn initial_charge_for(&self, model: &OscillatorModel) -> f64 {
        self.initial_charge.unwrap_or(model.charge_amplitude)
    }
}

/// Sampled trajectory and its energy aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub time: Vec<f64>,
    pub charge: Vec<f64>,
    pub current: Vec<f64>,
    pub voltage: Vec<f64>,
    pub energy_inductor: Vec<f64>,
    pub energy_capacitor: Vec<f64>,
    pub total_energy: Vec<f64>,
    pub mean_energy: f64,
    pub energy_std_dev: f64,
    pub stats: IntegrationStats,
}

/// The series RLC circuit as a first-order system over [Q, I].
struct RlcCircuit {
    r_over_l: f64,
    inv_lc: f64,
}

impl RlcCircuit {
    fn from_model(model: &OscillatorModel) -> Self {
        Self {
            r_over_l: model.resistance / model.inductance,
            inv_lc: 1.0 / (model.inductance * model.capacitance),
        }
    }
}

impl OdeSystem<2> for RlcCircuit {
    fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
        dydt[0] = y[1];
        dydt[1] = -self.r_over_l * y[1] - self.inv_lc * y[0];
    }
}

/// `n` evenly spaced points from 0 to `end`, both inclusive.
pub fn linspace(end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (n - 1) as f64;
            (0..n).map(|i| end * i as f64 / last).collect()
        }
    }
}

/// Integrate the model's ODE and derive voltage and energy series.
pub fn simulate(model: &OscillatorModel, options: &SimulationOptions) -> Result<SimulationResult> {
    let duration = options.span(model);
    if !duration.is_finite() || duration <= 0.0 {
        return Err(OscillatorError::InvalidInput(format!(
            "simulation span must be positive and finite, got {}",
            duration
        )));
    }
    if options.sample_count < 2 {
        return Err(OscillatorError::InvalidInput(format!(
            "sample count must be at least 2, got {}",
            options.sample_count
        )));
    }
    let q0 = options.initial_charge_for(model);
    if !q0.is_finite() {
        return Err(OscillatorError::InvalidInput(format!(
            "initial charge must be finite, got {}",
            q0
        )));
    }

    let t_eval = linspace(duration, options.sample_count);
    let circuit = RlcCircuit::from_model(model);
    let mut solver = DormandPrince::new(Tolerances {
        rtol: options.rtol,
        atol: options.atol,
    })
    .with_max_steps(options.max_steps);

    let trajectory = solver.integrate(&circuit, 0.0, &[q0, 0.0], &t_eval)?;

    log::debug!(
        "p={}: integrated {:.3e}s in {} accepted / {} rejected steps ({} evaluations)",
        model.prime,
        duration,
        trajectory.stats.accepted_steps,
        trajectory.stats.rejected_steps,
        trajectory.stats.fn_evals
    );

    let charge: Vec<f64> = trajectory.states.iter().map(|s| s[0]).collect();
    let current: Vec<f64> = trajectory.states.iter().map(|s| s[1]).collect();
    let voltage = charge.iter().map(|q| q / model.capacitance).collect();
    let energy = energy_series(&charge, &current, model.inductance, model.capacitance);
    let summary = summarize(&energy.total);

    Ok(SimulationResult {
        time: trajectory.times,
        charge,
        current,
        voltage,
        energy_inductor: energy.inductor,
        energy_capacitor: energy.capacitor,
        total_energy: energy.total,
        mean_energy: summary.mean_energy,
        energy_std_dev: summary.energy_std_dev,
        stats: trajectory.stats,
    })
}
