//! Error types for the oscillator engine.

use crate::integrator::IntegrationError;

/// Errors surfaced by model construction, simulation and prediction.
#[derive(Debug, thiserror::Error)]
pub enum OscillatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OscillatorError>;
