//! Characteristic boundary conditions
//!
//! Boundary states are computed from the previous time level with the method
//! of characteristics, then handed to the integrator, which overwrites nodes
//! 0 and nx-1 with them.
//!
//! # Riemann invariants
//!
//! For the wall law `p = f·(1 - sqrt(A0/a))` the wave speed is
//! `c(a) = sqrt(f/2)·(A0/a)^{1/4}`, which decreases with the area. With
//! `wave_speed` returning `-c`, the invariants are
//!
//! ```text
//! backward  w = u - 4·wave_speed(a)   carried along dx/dt = u + wave_speed(a)
//! forward   w = u + 4·wave_speed(a)   carried along dx/dt = u - wave_speed(a)
//! ```
//!
//! The inlet imposes the velocity and recovers the area from the backward
//! invariant; the outlet imposes the area and recovers the velocity from the
//! forward invariant.

use nalgebra::Vector2;

use crate::error::{Result, SimulationError};
use crate::models::Artery;
use crate::physics::{ConservationLaw, NodeCoefficients, VesselState};

/// Wrap `t` into `[0, period)`; identity when `period <= 0`
pub fn periodic(t: f64, period: f64) -> f64 {
    if period > 0.0 { t.rem_euclid(period) } else { t }
}

/// Linear interpolation (or extrapolation) through `(x[0], y[0])` and `(x[1], y[1])`
pub fn extrapolate(x0: f64, x: [f64; 2], y: [f64; 2]) -> f64 {
    y[0] + (y[1] - y[0]) * (x0 - x[0]) / (x[1] - x[0])
}

// =================================================================================================
// Inlet and outlet
// =================================================================================================

/// Inlet state `(a_in, a_in·u_in)` for a prescribed inlet velocity `velocity`
///
/// The backward invariant is traced back from the new time level to its foot
/// `x = -(u0 + wave_speed(a0))·dt` and interpolated between nodes 0 and 1.
/// The area then solves `w - u_in = 4·c0·(A0/a)^{1/4}`:
///
/// ```text
/// a_in = A0 · (4·c0 / (w - u_in))^4,   c0 = sqrt(f/2)
/// ```
///
/// # Errors
///
/// [`SimulationError::StabilityViolation`] at node 0 when `w - u_in <= 0`
/// (no real root) or when the previous state holds a non-positive area.
pub fn inlet_boundary(artery: &Artery, previous: &VesselState, velocity: f64, dt: f64, step: usize) -> Result<Vector2<f64>> {
    let at = [artery.coefficients(0), artery.coefficients(1)];
    let (u, c) = characteristic_data(artery, previous, [0, 1], &at, step)?;

    let w = [u[0] - 4.0 * c[0], u[1] - 4.0 * c[1]];
    let foot = -(u[0] + c[0]) * dt;
    let w_in = extrapolate(foot, [0.0, artery.dx()], w);

    let a0 = at[0].unstressed_area;
    let c0 = -artery.wave_speed(a0, &at[0]);
    let gap = w_in - velocity;
    if !(gap > 0.0) {
        return Err(SimulationError::stability(
            step,
            0,
            format!("inlet characteristic w = {} admits no area for velocity {}", w_in, velocity),
        ));
    }

    let area = a0 * (4.0 * c0 / gap).powi(4);
    Ok(Vector2::new(area, area * velocity))
}

/// Outlet state `(a_out, a_out·u_out)` for a prescribed outlet area `area`
///
/// The forward invariant is traced back to `x = L - (u - wave_speed(a))·dt` and
/// interpolated between the last two nodes; then
/// `u_out = w - 4·wave_speed(a_out)`.
pub fn outlet_boundary(artery: &Artery, previous: &VesselState, area: f64, dt: f64, step: usize) -> Result<Vector2<f64>> {
    let n = previous.points();
    let nodes = [n - 2, n - 1];
    let at = [artery.coefficients(nodes[0]), artery.coefficients(nodes[1])];
    let (u, c) = characteristic_data(artery, previous, nodes, &at, step)?;

    let w = [u[0] + 4.0 * c[0], u[1] + 4.0 * c[1]];
    let x = [artery.grid().position(nodes[0]), artery.grid().position(nodes[1])];
    let foot = x[1] - (u[1] - c[1]) * dt;
    let w_out = extrapolate(foot, x, w);

    if !(area > 0.0) {
        return Err(SimulationError::stability(
            step,
            nodes[1],
            format!("outlet area must be positive, got {}", area),
        ));
    }
    let velocity = w_out - 4.0 * artery.wave_speed(area, &at[1]);
    Ok(Vector2::new(area, area * velocity))
}

/// Coupling state for an internal junction
///
/// Junction coupling (mass and pressure continuity across a parent and its
/// two daughters) is not implemented: this always returns `None`, and the
/// network keeps the junction nodes at their previous values.
pub fn bifurcation_boundary(_parent: &Artery, _first: &Artery, _second: &Artery) -> Option<[Vector2<f64>; 3]> {
    None
}

/// Velocities and wave speeds at two boundary nodes
fn characteristic_data(
    artery: &Artery,
    previous: &VesselState,
    nodes: [usize; 2],
    at: &[NodeCoefficients; 2],
    step: usize,
) -> Result<([f64; 2], [f64; 2])> {
    let mut u = [0.0; 2];
    let mut c = [0.0; 2];
    for k in 0..2 {
        let area = previous.area(nodes[k]);
        if !(area > 0.0 && area.is_finite()) {
            return Err(SimulationError::stability(
                step,
                nodes[k],
                format!("non-positive area {} at boundary", area),
            ));
        }
        u[k] = previous.velocity(nodes[k]);
        c[k] = artery.wave_speed(area, &at[k]);
    }
    Ok((u, c))
}

// =================================================================================================
// CFL
// =================================================================================================

/// Courant check at one node: `dt/dx · |u ± c| <= 1`
pub fn check_courant<L: ConservationLaw + ?Sized>(
    law: &L,
    state: &Vector2<f64>,
    at: &NodeCoefficients,
    dt: f64,
    dx: f64,
    step: usize,
    node: usize,
) -> Result<()> {
    let (forward, backward) = law.characteristic_speeds(state, at);
    let ratio = dt / dx;
    for speed in [forward, backward] {
        let courant = ratio * speed.abs();
        if !(courant <= 1.0) {
            return Err(SimulationError::stability(
                step,
                node,
                format!("Courant number {:.4} exceeds 1", courant),
            ));
        }
    }
    Ok(())
}

/// CFL check on the first interior node of a vessel's current state
pub fn cfl_check(artery: &Artery, dt: f64, step: usize) -> Result<()> {
    let state = artery.state()?;
    check_courant(artery, &state.node(1), &artery.coefficients(1), dt, artery.dx(), step, 1)
}

// =================================================================================================
// Tests
// =================================================================================================
