//! Error types
//!
//! A run can fail in exactly two ways:
//!
//! - [`SimulationError::StabilityViolation`]: the explicit scheme left its
//!   stability region (CFL condition broken, area collapsed to zero or below,
//!   no real root for a characteristic relation). Fatal for the whole run; the
//!   remedy is a smaller time step and a fresh start.
//! - [`SimulationError::Configuration`]: the problem was set up wrongly
//!   (missing mesh, wrong number of initial conditions, invalid parameters).
//!   Only raised before the time loop starts.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Simulation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Numerical stability lost at a given time step and grid node
    #[error("stability violation at time step {step}, node {node}: {detail}. Reduce time step size.")]
    StabilityViolation {
        step: usize,
        node: usize,
        detail: String,
    },

    /// Invalid setup (parameters, mesh, initial conditions)
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SimulationError {
    /// Build a stability violation
    pub fn stability(step: usize, node: usize, detail: impl Into<String>) -> Self {
        Self::StabilityViolation {
            step,
            node,
            detail: detail.into(),
        }
    }

    /// Build a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// True for [`SimulationError::StabilityViolation`]
    pub fn is_stability_violation(&self) -> bool {
        matches!(self, Self::StabilityViolation { .. })
    }
}

// =================================================================================================
// Tests
// =================================================================================================
