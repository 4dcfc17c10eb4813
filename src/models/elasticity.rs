//! Exponential wall model
//!
//! Arterial wall stiffness grows as vessels get smaller. The three-parameter law
//!
//! ```text
//! f(R)  = 4/3 · k0 · exp(k1 · R) + k2
//! df/dR = 4/3 · k0 · k1 · exp(k1 · R)
//! ```
//!
//! gives the elasticity coefficient `f` entering the pressure law
//! `p = f · (1 - sqrt(A0 / A))` and its radial derivative `df`, which couples
//! wall taper into the momentum source term.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Three-parameter exponential wall model
///
/// # Example
///
/// ```rust
/// use hemo_rs::models::WallModel;
///
/// let wall = WallModel::constant(100.0);
/// assert_eq!(wall.elasticity(0.5), 100.0);
/// assert_eq!(wall.elasticity_derivative(0.5), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WallModel {
    /// Amplitude of the exponential term (pressure units)
    pub k0: f64,

    /// Exponential rate (1 / length units)
    pub k1: f64,

    /// Asymptotic stiffness (pressure units)
    pub k2: f64,
}

impl WallModel {
    /// Create a wall model from its three coefficients
    pub fn new(k0: f64, k1: f64, k2: f64) -> Self {
        Self { k0, k1, k2 }
    }

    /// Stiffness independent of the radius (`f = k2`, `df = 0`)
    pub fn constant(elasticity: f64) -> Self {
        Self {
            k0: 0.0,
            k1: 0.0,
            k2: elasticity,
        }
    }

    /// Coefficients fitted by Olufsen for human systemic arteries
    ///
    /// CGS units: k0, k2 in g/(s²·cm), k1 in 1/cm. Use
    /// [`WallModel::nondimensional`] before handing them to a dimensionless run.
    pub fn olufsen() -> Self {
        Self {
            k0: 2.0e7,
            k1: -22.53,
            k2: 8.65e5,
        }
    }

    /// Elasticity coefficient f at radius `radius`
    pub fn elasticity(&self, radius: f64) -> f64 {
        4.0 / 3.0 * self.k0 * (self.k1 * radius).exp() + self.k2
    }

    /// df/dR at radius `radius`
    pub fn elasticity_derivative(&self, radius: f64) -> f64 {
        4.0 / 3.0 * self.k0 * self.k1 * (self.k1 * radius).exp()
    }

    /// Rescale the coefficients with characteristic scales
    ///
    /// Pressures scale with `ρ·qc²/rc⁴`, lengths with `rc`.
    pub fn nondimensional(&self, scales: &CharacteristicScales) -> Self {
        let pressure = scales.pressure();
        Self {
            k0: self.k0 / pressure,
            k1: self.k1 * scales.radius,
            k2: self.k2 / pressure,
        }
    }

    /// Check that the wall is stiff at `radius`
    pub fn validate(&self, radius: f64) -> Result<()> {
        if ![self.k0, self.k1, self.k2].iter().all(|k| k.is_finite()) {
            return Err(SimulationError::configuration("wall model coefficients must be finite"));
        }
        let f = self.elasticity(radius);
        if f <= 0.0 {
            return Err(SimulationError::configuration(format!(
                "wall elasticity must be positive, got {} at radius {}",
                f, radius
            )));
        }
        Ok(())
    }
}

// =================================================================================================
// Characteristic scales
// =================================================================================================

/// Scales used to make the equations dimensionless
///
/// Lengths are measured in `radius`, flows in `flow`, so time is measured in
/// `radius³ / flow` and pressure in `density · flow² / radius⁴`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharacteristicScales {
    /// Characteristic radius rc
    pub radius: f64,

    /// Characteristic flow rate qc
    pub flow: f64,

    /// Blood density ρ
    pub density: f64,
}

impl CharacteristicScales {
    /// Create scales
    pub fn new(radius: f64, flow: f64, density: f64) -> Self {
        Self { radius, flow, density }
    }

    /// Time scale rc³/qc
    pub fn time(&self) -> f64 {
        self.radius.powi(3) / self.flow
    }

    /// Pressure scale ρ·qc²/rc⁴
    pub fn pressure(&self) -> f64 {
        self.density * self.flow * self.flow / self.radius.powi(4)
    }

    /// Reynolds number qc / (ν·rc) for kinematic viscosity `nu`
    pub fn reynolds(&self, nu: f64) -> f64 {
        self.flow / (nu * self.radius)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
