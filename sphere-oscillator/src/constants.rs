//! Process-wide physical constants.

/// π.
pub const PI: f64 = std::f64::consts::PI;

/// Reduced Planck constant ħ in J·s.
pub const HBAR: f64 = 1.054_571_817e-34;

/// Base "cosmic" frequency 1/(4π).
pub const COSMIC_FREQUENCY: f64 = 1.0 / (4.0 * PI);

/// Zero-point energy ħ·f₀/2 shared by every model.
pub const ZERO_POINT_ENERGY: f64 = HBAR * COSMIC_FREQUENCY / 2.0;
