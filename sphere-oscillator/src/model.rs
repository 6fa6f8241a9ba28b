//! Oscillator parameter derivation.
//!
//! Maps an integer `p` (nominally prime), a sphere radius and a charge onto
//! the constants of a series RLC circuit driven at angular frequency 2p:
//!
//! - surface area A = 4πr², frequency p/π, angular frequency 2p, period π/p
//! - R = √p, L = A / (16π³q)
//! - C either solved from the resonance condition LC = 1/(4p²)
//!   ([`ModelVariant::SelfConsistent`], the canonical construction) or derived
//!   on its own as 4π³q / (A·p²) ([`ModelVariant::Independent`])
//!
//! Everything downstream (integrator, analytical solution, predictors) reads
//! these values and never re-derives them.

use std::fmt;

use prime_core::is_prime;
use serde::{Deserialize, Serialize};

use crate::constants::{HBAR, PI, ZERO_POINT_ENERGY};
use crate::error::{OscillatorError, Result};

/// Which capacitance formula a model was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// C = 1/(4p²L): the resonance condition holds up to rounding.
    #[default]
    SelfConsistent,
    /// C = 4π³q/(A·p²): resonance error is a diagnostic output.
    Independent,
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::SelfConsistent => write!(f, "self-consistent"),
            ModelVariant::Independent => write!(f, "independent"),
        }
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = OscillatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "self_consistent" | "self-consistent" => Ok(ModelVariant::SelfConsistent),
            "independent" => Ok(ModelVariant::Independent),
            other => Err(OscillatorError::InvalidInput(format!(
                "unknown model variant '{}'",
                other
            ))),
        }
    }
}

/// Oscillator constants derived from (prime, radius, charge).
///
/// Built once per triple and never mutated afterwards; deriving a damped or
/// undamped sibling goes through [`OscillatorModel::with_resistance`], which
/// returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OscillatorModel {
    pub prime: u64,
    pub radius: f64,
    pub charge: f64,
    pub variant: ModelVariant,
    /// Advisory flag: false when `prime` failed the primality test.
    pub is_prime_input: bool,

    pub surface_area: f64,
    pub frequency: f64,
    pub angular_frequency: f64,
    pub period: f64,

    pub resistance: f64,
    pub inductance: f64,
    pub capacitance: f64,
    pub voltage: f64,

    pub lc_product: f64,
    pub resonance_theoretical: f64,
    /// |LC − 1/(4p²)| / (1/(4p²)), as a fraction.
    pub resonance_error: f64,

    pub natural_frequency: f64,
    /// γ = R / 2L
    pub damping_factor: f64,
    /// Q = ω₀L / R
    pub quality_factor: f64,
    /// τ = 2L / R
    pub time_constant: f64,
    /// |Z| at the driving frequency 2p.
    pub impedance: f64,

    /// Default initial charge Q(0) for simulation and the analytical solution.
    pub charge_amplitude: f64,
    pub voltage_amplitude: f64,

    pub quantum_energy: f64,
    pub zero_point_energy: f64,
    pub quantum_ratio: f64,
    pub theoretical_quantum_ratio: f64,
}

/// Build the canonical (self-consistent) model.
pub fn build_model(prime: u64, radius: f64, charge: f64) -> Result<OscillatorModel> {
    OscillatorModel::new(prime, radius, charge)
}

impl OscillatorModel {
    /// Canonical construction: capacitance solved from the resonance condition.
    pub fn new(prime: u64, radius: f64, charge: f64) -> Result<Self> {
        Self::with_variant(prime, radius, charge, ModelVariant::SelfConsistent)
    }

    /// Unit sphere with unit charge.
    pub fn for_prime(prime: u64) -> Result<Self> {
        Self::new(prime, 1.0, 1.0)
    }

    pub fn with_variant(
        prime: u64,
        radius: f64,
        charge: f64,
        variant: ModelVariant,
    ) -> Result<Self> {
        if prime < 2 {
            return Err(OscillatorError::InvalidInput(format!(
                "prime must be >= 2, got {}",
                prime
            )));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(OscillatorError::InvalidInput(format!(
                "radius must be positive and finite, got {}",
                radius
            )));
        }
        if !charge.is_finite() || charge == 0.0 {
            return Err(OscillatorError::InvalidInput(format!(
                "charge must be non-zero and finite, got {}",
                charge
            )));
        }

        let is_prime_input = is_prime(prime);
        if !is_prime_input {
            log::debug!("building oscillator model for non-prime input {}", prime);
        }

        let p = prime as f64;
        let pi3 = PI.powi(3);

        let surface_area = 4.0 * PI * radius * radius;
        let frequency = p / PI;
        let angular_frequency = 2.0 * p;
        let period = 2.0 * PI / angular_frequency;

        let resistance = p.sqrt();
        let inductance = surface_area / (16.0 * pi3 * charge);
        let capacitance = match variant {
            ModelVariant::SelfConsistent => 1.0 / (4.0 * p * p * inductance),
            ModelVariant::Independent => 4.0 * pi3 * charge / (surface_area * p * p),
        };
        let voltage = surface_area * p * p / (4.0 * pi3);

        let lc_product = inductance * capacitance;
        let resonance_theoretical = 1.0 / (4.0 * p * p);
        let resonance_error = (lc_product - resonance_theoretical).abs() / resonance_theoretical;
        let natural_frequency = 1.0 / lc_product.sqrt();

        let quantum_energy = 2.0 * HBAR * p;
        let zero_point_energy = ZERO_POINT_ENERGY;

        let mut model = OscillatorModel {
            prime,
            radius,
            charge,
            variant,
            is_prime_input,
            surface_area,
            frequency,
            angular_frequency,
            period,
            resistance,
            inductance,
            capacitance,
            voltage,
            lc_product,
            resonance_theoretical,
            resonance_error,
            natural_frequency,
            damping_factor: 0.0,
            quality_factor: 0.0,
            time_constant: 0.0,
            impedance: 0.0,
            charge_amplitude: 0.0,
            voltage_amplitude: 0.0,
            quantum_energy,
            zero_point_energy,
            quantum_ratio: quantum_energy / zero_point_energy,
            theoretical_quantum_ratio: 16.0 * PI * p,
        };
        model.derive_damping();

        model.charge_amplitude = match variant {
            ModelVariant::SelfConsistent => p / (PI * model.impedance),
            ModelVariant::Independent => p / (PI * resistance.abs()),
        };
        model.voltage_amplitude = model.charge_amplitude / capacitance;

        Ok(model)
    }

    /// Copy of this model with the resistance replaced and every
    /// resistance-dependent quantity re-derived. The charge amplitude is kept,
    /// so `with_resistance(0.0)` starts from the same state as the damped model.
    pub fn with_resistance(&self, resistance: f64) -> Result<Self> {
        if !resistance.is_finite() || resistance < 0.0 {
            return Err(OscillatorError::InvalidInput(format!(
                "resistance must be non-negative and finite, got {}",
                resistance
            )));
        }
        let mut model = self.clone();
        model.resistance = resistance;
        model.derive_damping();
        Ok(model)
    }

    /// Relative error of the quantum ratio against 16πp, as a percentage.
    pub fn quantum_ratio_error_percentage(&self) -> f64 {
        (self.quantum_ratio - self.theoretical_quantum_ratio).abs() / self.theoretical_quantum_ratio
            * 100.0
    }

    fn derive_damping(&mut self) {
        let r = self.resistance;
        let l = self.inductance;
        let omega = self.angular_frequency;

        self.damping_factor = r / (2.0 * l);
        self.quality_factor = self.natural_frequency * l / r;
        self.time_constant = 2.0 * l / r;

        let x_l = omega * l;
        let x_c = 1.0 / (omega * self.capacitance);
        self.impedance = (r * r + (x_l - x_c).powi(2)).sqrt();
    }
}

impl fmt::Display for OscillatorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OscillatorModel(prime={}, variant={}, accuracy={:.6})",
            self.prime,
            self.variant,
            1.0 - self.resonance_error
        )
    }
}
