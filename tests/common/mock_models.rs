//! Mock conservation laws for testing
//!
//! These laws have known exact solutions, which makes them a clean check of
//! the integrator independently of the artery physics.

use hemo_rs::physics::{ConservationLaw, NodeCoefficients};
use nalgebra::Vector2;

// =================================================================================================
// Linear advection: U_t + c·U_x = 0
// =================================================================================================

/// Both components advected at constant speed `speed`
///
/// Exact solution: U(x, t) = U₀(x - speed·t)
///
/// The flux is linear, so the Lax-Wendroff predictor and corrector reduce to
/// the classic one-step Lax-Wendroff scheme.
pub struct LinearAdvection {
    pub points: usize,
    pub speed: f64,
}

impl LinearAdvection {
    pub fn new(points: usize, speed: f64) -> Self {
        Self { points, speed }
    }

    /// Exact solution at (x, t) for the initial profile `initial`
    pub fn exact<F>(&self, initial: F, x: f64, t: f64) -> Vector2<f64>
    where
        F: Fn(f64) -> Vector2<f64>,
    {
        initial(x - self.speed * t)
    }
}

impl ConservationLaw for LinearAdvection {
    fn points(&self) -> usize {
        self.points
    }

    fn coefficients(&self, _node: usize) -> NodeCoefficients {
        NodeCoefficients::new(1.0, 0.0)
    }

    fn flux(&self, state: &Vector2<f64>, _at: &NodeCoefficients) -> Vector2<f64> {
        *state * self.speed
    }

    fn source(&self, _state: &Vector2<f64>, _at: &NodeCoefficients) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn wave_speed(&self, _area: f64, _at: &NodeCoefficients) -> f64 {
        -self.speed
    }

    fn name(&self) -> &str {
        "Linear Advection"
    }
}
