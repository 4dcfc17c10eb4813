//! Richtmyer two-step Lax-Wendroff scheme
//!
//! # Mathematical Background
//!
//! For a balance law `U_t + F(U)_x = S(U)` the scheme first predicts the state
//! at the half time level on the cell faces
//!
//! ```text
//! U_{j+½} = (U_j + U_{j+1})/2 + dt/2 · ( -(F_{j+1} - F_j)/dx + (S_j + S_{j+1})/2 )
//! ```
//!
//! then corrects the node values with fluxes and sources evaluated at those
//! predicted states:
//!
//! ```text
//! U_j^{n+1} = U_j - dt/dx · (F(U_{j+½}) - F(U_{j-½})) + dt/2 · (S(U_{j+½}) + S(U_{j-½}))
//! ```
//!
//! # Characteristics
//!
//! - **Order**: second order in space and time (halving dx and dt together
//!   divides the error by ~4)
//! - **Stability**: explicit, conditionally stable; `dt/dx · |u ± c| <= 1` is
//!   checked on every interior node after the update
//! - **Cost**: 4 flux and source evaluations per node and step
//!
//! Flux and source are evaluated at the predicted half states, never at the
//! old node values: doing the latter silently drops the scheme to first order.
//!
//! # Example
//!
//! ```rust,ignore
//! let integrator = LaxWendroff::new(dt, artery.dx())?;
//! let next = integrator.step(&artery, artery.state()?, &inlet, &outlet, 1)?;
//! ```

use nalgebra::{DMatrix, Vector2};

use crate::error::{Result, SimulationError};
use crate::physics::{ConservationLaw, InitialCondition, VesselState};
use crate::solver::boundary::check_courant;
use crate::solver::traits::{RecordSchedule, SimulationResult, TimeConfiguration};
use crate::solver::validate_state;

// =================================================================================================
// Lax-Wendroff integrator
// =================================================================================================

/// Two-step Lax-Wendroff integrator for one vessel
///
/// Holds only `dt` and `dx`: every call reads an explicit previous state and
/// returns a new one, so the same integrator can be shared by all vessels with
/// the same spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaxWendroff {
    dt: f64,
    dx: f64,
}

impl LaxWendroff {
    /// Create an integrator
    ///
    /// # Errors
    ///
    /// `dt` or `dx` not strictly positive and finite.
    pub fn new(dt: f64, dx: f64) -> Result<Self> {
        if !(dt > 0.0 && dt.is_finite() && dx > 0.0 && dx.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "time step and grid spacing must be positive, got dt = {}, dx = {}",
                dt, dx
            )));
        }
        Ok(Self { dt, dx })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// dt/dx
    pub fn mesh_ratio(&self) -> f64 {
        self.dt / self.dx
    }

    pub fn name(&self) -> &'static str {
        "Richtmyer Lax-Wendroff"
    }

    /// Advance `previous` by one time step
    ///
    /// Interior nodes come from the scheme; nodes 0 and nx-1 are set to
    /// `inlet` and `outlet`. `step` is the index of the new time level and
    /// only appears in error reports.
    ///
    /// # Errors
    ///
    /// [`SimulationError::StabilityViolation`] when an area in the stencil or
    /// in a predicted state is not strictly positive and finite, or when the
    /// CFL condition fails at a freshly updated node.
    pub fn step<L: ConservationLaw + ?Sized>(
        &self,
        law: &L,
        previous: &VesselState,
        inlet: &Vector2<f64>,
        outlet: &Vector2<f64>,
        step: usize,
    ) -> Result<VesselState> {
        let n = previous.points();
        if n < 3 || law.points() != n {
            return Err(SimulationError::configuration(format!(
                "{}: state has {} nodes, law expects {} (at least 3)",
                law.name(),
                n,
                law.points()
            )));
        }
        for j in 0..n {
            ensure_area(previous.area(j), step, j)?;
        }

        let (dt, dx) = (self.dt, self.dx);
        let flux = law.flux_range(previous, 0..n);
        let source = law.source_range(previous, 0..n);

        // Predicted states on the n - 1 faces, with their flux and source
        let mut half_flux = Vec::with_capacity(n - 1);
        let mut half_source = Vec::with_capacity(n - 1);
        for left in 0..n - 1 {
            let right = left + 1;
            let predicted = (previous.node(left) + previous.node(right)) * 0.5
                + (-(column(&flux, right) - column(&flux, left)) / dx
                    + (column(&source, left) + column(&source, right)) * 0.5)
                    * (0.5 * dt);
            ensure_area(predicted[0], step, left)?;

            let at = law.half_coefficients(left);
            half_flux.push(law.flux(&predicted, &at));
            half_source.push(law.source(&predicted, &at));
        }

        let mut next = VesselState::zeros(n);
        next.set_node(0, inlet);
        next.set_node(n - 1, outlet);

        for j in 1..n - 1 {
            let updated = previous.node(j) - (half_flux[j] - half_flux[j - 1]) * (dt / dx)
                + (half_source[j] + half_source[j - 1]) * (0.5 * dt);

            ensure_area(updated[0], step, j)?;
            check_courant(law, &updated, &law.coefficients(j), dt, dx, step, j)?;
            next.set_node(j, &updated);
        }

        Ok(next)
    }

    /// Standalone run of `steps` steps from `initial`
    ///
    /// `inlet` and `outlet` receive the previous state and the new time and
    /// return the boundary states. `records` snapshots are kept, evenly spaced
    /// over `[0, steps·dt]`; the first one is the initial state.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] for a wrong number of initial
    /// conditions or a recording cadence finer than dt, before any step is
    /// taken; [`SimulationError::StabilityViolation`] from the steps.
    pub fn solve<L, I, O>(
        &self,
        law: &L,
        initial: &[InitialCondition],
        steps: usize,
        records: usize,
        mut inlet: I,
        mut outlet: O,
    ) -> Result<SimulationResult>
    where
        L: ConservationLaw + ?Sized,
        I: FnMut(&VesselState, f64) -> Result<Vector2<f64>>,
        O: FnMut(&VesselState, f64) -> Result<Vector2<f64>>,
    {
        let timing = TimeConfiguration::fixed(steps, self.dt, records);
        timing.validate()?;
        let mut state = VesselState::from_initial_conditions(initial, law.points())?;
        let mut schedule = RecordSchedule::from_configuration(&timing);

        let mut time_points = Vec::with_capacity(records);
        let mut trajectory = Vec::with_capacity(records);
        if schedule.check(0.0).is_some() {
            time_points.push(0.0);
            trajectory.push(state.clone());
        }

        for k in 1..=steps {
            let t = timing.time(k);
            let inlet_state = inlet(&state, t)?;
            let outlet_state = outlet(&state, t)?;

            state = self.step(law, &state, &inlet_state, &outlet_state, k)?;
            validate_state(&state, k)?;

            if schedule.check(t).is_some() {
                time_points.push(t);
                trajectory.push(state.clone());
            }
        }

        let mut result = SimulationResult::new(time_points, trajectory, state);
        result.add_metadata("solver", self.name());
        result.add_metadata("law", law.name());
        result.add_metadata("time steps", &steps.to_string());
        result.add_metadata("dt", &self.dt.to_string());
        result.add_metadata("dx", &self.dx.to_string());
        Ok(result)
    }
}

#[inline]
fn column(values: &DMatrix<f64>, j: usize) -> Vector2<f64> {
    values.fixed_view::<2, 1>(0, j).into_owned()
}

#[inline]
fn ensure_area(area: f64, step: usize, node: usize) -> Result<()> {
    if area > 0.0 && area.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::stability(
            step,
            node,
            format!("area {} is not positive", area),
        ))
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::NodeCoefficients;
    use approx::assert_relative_eq;

    /// Both components advected at speed `speed`, optional linear decay of q
    struct Advection {
        points: usize,
        speed: f64,
        decay: f64,
    }

    impl ConservationLaw for Advection {
        fn points(&self) -> usize {
            self.points
        }

        fn coefficients(&self, _node: usize) -> NodeCoefficients {
            NodeCoefficients::new(1.0, 0.0)
        }

        fn flux(&self, state: &Vector2<f64>, _at: &NodeCoefficients) -> Vector2<f64> {
            *state * self.speed
        }

        fn source(&self, state: &Vector2<f64>, _at: &NodeCoefficients) -> Vector2<f64> {
            Vector2::new(0.0, -self.decay * state[1])
        }

        fn wave_speed(&self, _area: f64, _at: &NodeCoefficients) -> f64 {
            -self.speed
        }

        fn name(&self) -> &str {
            "Advection"
        }
    }

    fn advection(points: usize) -> Advection {
        Advection {
            points,
            speed: 1.0,
            decay: 0.0,
        }
    }

    #[test]
    fn test_invalid_spacing() {
        assert!(LaxWendroff::new(0.0, 0.1).is_err());
        assert!(LaxWendroff::new(0.1, -1.0).is_err());
        assert!(LaxWendroff::new(f64::NAN, 0.1).is_err());
        assert_relative_eq!(LaxWendroff::new(0.05, 0.1).unwrap().mesh_ratio(), 0.5);
    }

    #[test]
    fn test_uniform_state_is_preserved() {
        // Velocity u = q/a = 0: characteristic speeds are ±1
        let law = advection(11);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let state = VesselState::uniform(11, 2.0, 0.0);

        let next = integrator
            .step(&law, &state, &state.first(), &state.last(), 1)
            .unwrap();

        for j in 0..11 {
            assert_relative_eq!(next.area(j), 2.0, epsilon = 1e-14);
            assert_relative_eq!(next.flow(j), 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_boundary_nodes_come_from_arguments() {
        let law = advection(5);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let state = VesselState::uniform(5, 1.0, 0.0);

        let next = integrator
            .step(&law, &state, &Vector2::new(3.0, 0.5), &Vector2::new(4.0, -0.5), 1)
            .unwrap();

        assert_eq!(next.node(0), Vector2::new(3.0, 0.5));
        assert_eq!(next.node(4), Vector2::new(4.0, -0.5));
    }

    #[test]
    fn test_linear_profile_is_advected_exactly() {
        // Lax-Wendroff is exact for linear data under linear advection
        let law = advection(6);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let area: Vec<f64> = (0..6).map(|j| 1.0 + 0.1 * j as f64).collect();
        let state = VesselState::from_profiles(&area, &[0.0; 6]).unwrap();

        let next = integrator
            .step(&law, &state, &state.first(), &state.last(), 1)
            .unwrap();

        // a(x - t): shift by dt·speed = 0.05 = dx/2
        for j in 1..5 {
            assert_relative_eq!(next.area(j), area[j] - 0.05, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_source_term() {
        // No gradients: q' = -k q integrated to second order
        let law = Advection {
            points: 5,
            speed: 1.0,
            decay: 2.0,
        };
        let integrator = LaxWendroff::new(0.01, 0.1).unwrap();
        let state = VesselState::uniform(5, 100.0, 1.0);
        let next = integrator
            .step(&law, &state, &state.first(), &state.last(), 1)
            .unwrap();

        // 1 - k·dt + (k·dt)²/2
        assert_relative_eq!(next.flow(2), 1.0 - 0.02 + 0.0002, epsilon = 1e-12);
    }

    #[test]
    fn test_cfl_violation_names_step_and_node() {
        let law = advection(7);
        // dt/dx = 2 > 1
        let integrator = LaxWendroff::new(0.2, 0.1).unwrap();
        let state = VesselState::uniform(7, 1.0, 0.0);

        let error = integrator
            .step(&law, &state, &state.first(), &state.last(), 12)
            .unwrap_err();

        assert_eq!(
            error,
            SimulationError::stability(12, 1, "Courant number 2.0000 exceeds 1")
        );
    }

    #[test]
    fn test_non_positive_area_is_stability_violation() {
        let law = advection(5);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let mut state = VesselState::uniform(5, 1.0, 0.0);
        state.set_node(3, &Vector2::new(-1.0, 0.0));

        let error = integrator
            .step(&law, &state, &state.first(), &state.last(), 4)
            .unwrap_err();
        assert!(matches!(error, SimulationError::StabilityViolation { step: 4, node: 3, .. }));
    }

    #[test]
    fn test_size_mismatch() {
        let law = advection(5);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let state = VesselState::uniform(4, 1.0, 0.0);

        let error = integrator
            .step(&law, &state, &state.first(), &state.last(), 1)
            .unwrap_err();
        assert!(matches!(error, SimulationError::Configuration(_)));
    }

    #[test]
    fn test_solve_records_evenly_spaced_snapshots() {
        let law = advection(11);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let initial = [InitialCondition::Uniform(1.0), InitialCondition::Uniform(0.0)];

        let result = integrator
            .solve(
                &law,
                &initial,
                40,
                5,
                |state, _t| Ok(state.first()),
                |state, _t| Ok(state.last()),
            )
            .unwrap();

        assert_eq!(result.len(), 5);
        for (i, t) in result.time_points.iter().enumerate() {
            assert!((t - 0.5 * i as f64).abs() < 0.05 + 1e-12);
        }
        assert_relative_eq!(result.time_points[4], 2.0, epsilon = 1e-12);
        assert_eq!(result.trajectory[0], VesselState::uniform(11, 1.0, 0.0));
        assert_eq!(result.metadata.get("time steps").map(String::as_str), Some("40"));
    }

    #[test]
    fn test_solve_passes_new_time_to_boundaries() {
        let law = advection(5);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let initial = [InitialCondition::Uniform(1.0), InitialCondition::Uniform(0.0)];
        let mut seen = Vec::new();

        integrator
            .solve(
                &law,
                &initial,
                3,
                2,
                |state, t| {
                    seen.push(t);
                    Ok(state.first())
                },
                |state, _t| Ok(state.last()),
            )
            .unwrap();

        assert_eq!(seen.len(), 3);
        assert_relative_eq!(seen[0], 0.05);
        assert_relative_eq!(seen[2], 0.15);
    }

    #[test]
    fn test_solve_rejects_wrong_number_of_initial_conditions() {
        let law = advection(5);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let initial = [InitialCondition::Uniform(1.0)];

        let error = integrator
            .solve(&law, &initial, 10, 2, |s, _| Ok(s.first()), |s, _| Ok(s.last()))
            .unwrap_err();
        assert!(error.to_string().contains("1 initial conditions supplied, 2 expected"));
    }

    #[test]
    fn test_solve_rejects_records_finer_than_dt() {
        let law = advection(5);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let initial = [InitialCondition::Uniform(1.0), InitialCondition::Uniform(0.0)];

        let result = integrator.solve(&law, &initial, 10, 50, |s, _| Ok(s.first()), |s, _| Ok(s.last()));
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_solve_propagates_boundary_failure() {
        let law = advection(5);
        let integrator = LaxWendroff::new(0.05, 0.1).unwrap();
        let initial = [InitialCondition::Uniform(1.0), InitialCondition::Uniform(0.0)];

        let result = integrator.solve(
            &law,
            &initial,
            10,
            2,
            |_, _| Ok(Vector2::new(f64::NAN, 0.0)),
            |s, _| Ok(s.last()),
        );
        assert!(result.unwrap_err().is_stability_violation());
    }
}
