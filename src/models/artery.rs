//! Elastic artery segment
//!
//! One vessel of the network: a straight (possibly tapered) elastic tube of
//! length `L`, discretised on `nx` equally spaced nodes. The vessel provides
//! the physics of the 1-D blood-flow equations
//!
//! ```text
//! ∂a/∂t + ∂q/∂x = 0
//! ∂q/∂t + ∂(q²/a + f·sqrt(A0·a))/∂x = S(a, q)
//! ```
//!
//! through the [`ConservationLaw`] trait, and owns its current state and its
//! reduced-resolution history.
//!
//! # Lifecycle
//!
//! 1. [`Artery::new`]: geometry and wall parameters, fixed afterwards
//! 2. [`Artery::mesh`]: grid spacing, unstressed area and taper per node
//! 3. [`Artery::initial_conditions`]: state at rest and history buffers
//! 4. [`Artery::advance`]: one time step, optionally recorded
//!
//! # Example
//!
//! ```rust
//! use hemo_rs::models::{Artery, ArteryParameters, WallModel};
//! use hemo_rs::physics::ConservationLaw;
//!
//! let parameters = ArteryParameters::new(WallModel::constant(100.0), 20.0, 1000.0, 0.1);
//! let mut artery = Artery::new(0, 0, 1.0, 1.0, &parameters)?;
//! artery.mesh(41)?;
//! artery.initial_conditions(0.0, 10)?;
//!
//! // Zero transmural pressure at the unstressed area
//! let a0 = artery.unstressed_area()[0];
//! assert_eq!(artery.pressure(a0, 0), 0.0);
//! assert!(artery.wave_speed(a0, &artery.coefficients(0)) < 0.0);
//! # Ok::<(), hemo_rs::SimulationError>(())
//! ```

use std::f64::consts::PI;

use nalgebra::Vector2;

use crate::error::{Result, SimulationError};
use crate::models::parameters::ArteryParameters;
use crate::physics::{ConservationLaw, History, InitialCondition, NodeCoefficients, VesselState, AREA};
use crate::solver::LaxWendroff;

// =================================================================================================
// Grid
// =================================================================================================

/// Spatial discretisation of a vessel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    dx: f64,
    unstressed_area: Vec<f64>,
    radius_gradient: Vec<f64>,
}

impl Grid {
    /// Uniform grid over `[0, length]` with a linear radius profile
    fn tapered(length: f64, inlet_radius: f64, outlet_radius: f64, points: usize) -> Self {
        let dx = length / (points - 1) as f64;
        let radius: Vec<f64> = (0..points)
            .map(|j| inlet_radius + (outlet_radius - inlet_radius) * j as f64 / (points - 1) as f64)
            .collect();

        // Central differences inside, one-sided at both ends
        let radius_gradient = (0..points)
            .map(|j| match j {
                0 => (radius[1] - radius[0]) / dx,
                j if j == points - 1 => (radius[j] - radius[j - 1]) / dx,
                j => (radius[j + 1] - radius[j - 1]) / (2.0 * dx),
            })
            .collect();

        Self {
            dx,
            unstressed_area: radius.iter().map(|r| PI * r * r).collect(),
            radius_gradient,
        }
    }

    /// Number of nodes (0 before meshing)
    pub fn points(&self) -> usize {
        self.unstressed_area.len()
    }

    /// Node spacing
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Axial position of node `j`
    pub fn position(&self, j: usize) -> f64 {
        j as f64 * self.dx
    }

    /// Unstressed area A0 per node
    pub fn unstressed_area(&self) -> &[f64] {
        &self.unstressed_area
    }

    /// dR0/dx per node
    pub fn radius_gradient(&self) -> &[f64] {
        &self.radius_gradient
    }
}

// =================================================================================================
// Artery
// =================================================================================================

/// Current state and recorded history of a vessel
#[derive(Debug, Clone)]
struct Solution {
    current: VesselState,
    history: History,
}

/// One elastic vessel segment
#[derive(Debug, Clone)]
pub struct Artery {
    position: usize,
    level: usize,
    inlet_radius: f64,
    outlet_radius: f64,
    length: f64,
    elasticity: f64,
    elasticity_derivative: f64,
    reynolds: f64,
    delta: f64,
    grid: Grid,
    solution: Option<Solution>,
}

impl Artery {
    /// Create a vessel
    ///
    /// # Arguments
    ///
    /// * `position` - Breadth-first index in the tree (0 = root)
    /// * `level` - Generation in the tree (0 = root)
    /// * `inlet_radius`, `outlet_radius` - Unstressed radii at both ends
    /// * `parameters` - Wall law, length ratio, Re and δ
    ///
    /// The wall law is evaluated at the inlet radius and the vessel length is
    /// `inlet_radius · length_ratio`.
    pub fn new(
        position: usize,
        level: usize,
        inlet_radius: f64,
        outlet_radius: f64,
        parameters: &ArteryParameters,
    ) -> Result<Self> {
        if !(inlet_radius > 0.0 && outlet_radius > 0.0 && inlet_radius.is_finite() && outlet_radius.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "artery {}: radii must be positive, got {} and {}",
                position, inlet_radius, outlet_radius
            )));
        }
        parameters.validate(inlet_radius)?;

        Ok(Self {
            position,
            level,
            inlet_radius,
            outlet_radius,
            length: inlet_radius * parameters.length_ratio,
            elasticity: parameters.wall.elasticity(inlet_radius),
            elasticity_derivative: parameters.wall.elasticity_derivative(inlet_radius),
            reynolds: parameters.reynolds,
            delta: parameters.delta,
            grid: Grid::default(),
            solution: None,
        })
    }

    // ====== Setup ======

    /// Discretise the vessel on `points` equally spaced nodes
    ///
    /// Meshing again discards any state set before.
    ///
    /// # Errors
    ///
    /// `points < 3`: the Lax-Wendroff stencil needs at least one interior node.
    pub fn mesh(&mut self, points: usize) -> Result<()> {
        if points < 3 {
            return Err(SimulationError::configuration(format!(
                "artery {}: at least 3 nodes required, got {}",
                self.position, points
            )));
        }
        self.grid = Grid::tapered(self.length, self.inlet_radius, self.outlet_radius, points);
        self.solution = None;
        Ok(())
    }

    /// True once [`Artery::mesh`] has been called
    pub fn is_meshed(&self) -> bool {
        self.grid.points() > 0
    }

    /// Vessel at rest: area `A0` everywhere, uniform flow `flow`
    ///
    /// Allocates room for `records` snapshots.
    pub fn initial_conditions(&mut self, flow: f64, records: usize) -> Result<()> {
        self.require_mesh()?;
        let conditions = [
            InitialCondition::Profile(self.grid.unstressed_area.clone()),
            InitialCondition::Uniform(flow),
        ];
        self.set_initial_conditions(&conditions, records)
    }

    /// Arbitrary initial fields, one per equation (area, then flow)
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when the vessel is not meshed, when
    /// `conditions` does not hold exactly two entries, or when a profile does
    /// not match the mesh.
    pub fn set_initial_conditions(&mut self, conditions: &[InitialCondition], records: usize) -> Result<()> {
        self.require_mesh()?;
        if records == 0 {
            return Err(SimulationError::configuration(format!(
                "artery {}: at least one record required",
                self.position
            )));
        }
        let current = VesselState::from_initial_conditions(conditions, self.grid.points())?;
        if let Some(j) = (0..current.points()).find(|&j| !(current.area(j) > 0.0)) {
            return Err(SimulationError::configuration(format!(
                "artery {}: initial area must be positive, got {} at node {}",
                self.position,
                current.area(j),
                j
            )));
        }

        self.solution = Some(Solution {
            history: History::new(records, current.points()),
            current,
        });
        Ok(())
    }

    /// Replace the current state (history is kept)
    pub fn set_state(&mut self, state: VesselState) -> Result<()> {
        let points = self.grid.points();
        let position = self.position;
        let solution = self.solution_mut()?;
        if state.points() != points {
            return Err(SimulationError::configuration(format!(
                "artery {}: state has {} nodes, mesh has {}",
                position,
                state.points(),
                points
            )));
        }
        solution.current = state;
        Ok(())
    }

    fn require_mesh(&self) -> Result<()> {
        if self.is_meshed() {
            Ok(())
        } else {
            Err(SimulationError::configuration(format!(
                "artery {} is not meshed; call mesh(nx) before setting initial conditions",
                self.position
            )))
        }
    }

    fn solution_mut(&mut self) -> Result<&mut Solution> {
        let position = self.position;
        self.solution.as_mut().ok_or_else(|| {
            SimulationError::configuration(format!("artery {} has no initial conditions", position))
        })
    }

    // ====== Time stepping ======

    /// Advance the vessel by one time step
    ///
    /// `inlet` and `outlet` are the boundary states for nodes 0 and nx-1 at
    /// the new time level. When `record` is set, the new area, flow and
    /// pressure are stored at that snapshot index; an index outside the
    /// history is a configuration error and leaves the state untouched.
    pub fn advance(
        &mut self,
        integrator: &LaxWendroff,
        inlet: &Vector2<f64>,
        outlet: &Vector2<f64>,
        step: usize,
        record: Option<usize>,
    ) -> Result<()> {
        let next = integrator.step(self, self.state()?, inlet, outlet, step)?;

        let pressure = self.pressure_profile(&next);
        let solution = self.solution_mut()?;
        if let Some(index) = record {
            solution.history.record(index, &next, &pressure)?;
        }
        solution.current = next;
        Ok(())
    }

    /// Store the current state at snapshot `index`
    pub fn record(&mut self, index: usize) -> Result<()> {
        let pressure = self.pressure_profile(self.state()?);
        let solution = self.solution_mut()?;
        solution.history.record(index, &solution.current, &pressure)
    }

    // ====== Constitutive relations ======

    /// Transmural pressure `f·(1 - sqrt(A0/a))` at `node`
    pub fn pressure(&self, area: f64, node: usize) -> f64 {
        self.elasticity * (1.0 - (self.grid.unstressed_area[node] / area).sqrt())
    }

    /// Pressure on every node of `state`
    pub fn pressure_profile(&self, state: &VesselState) -> Vec<f64> {
        (0..state.points()).map(|j| self.pressure(state.area(j), j)).collect()
    }

    /// Area producing pressure `pressure` at `node` (inverse of [`Artery::pressure`])
    ///
    /// # Errors
    ///
    /// The wall law saturates at `p = f`; any pressure at or beyond it has no
    /// finite area.
    pub fn area_at_pressure(&self, pressure: f64, node: usize) -> Result<f64> {
        let ratio = 1.0 - pressure / self.elasticity;
        if !(ratio > 0.0) {
            return Err(SimulationError::configuration(format!(
                "artery {}: pressure {} exceeds the wall law limit {}",
                self.position, pressure, self.elasticity
            )));
        }
        Ok(self.grid.unstressed_area[node] / (ratio * ratio))
    }

    // ====== Accessors ======

    /// Breadth-first index in the tree
    pub fn position(&self) -> usize {
        self.position
    }

    /// Generation in the tree (0 = root)
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn inlet_radius(&self) -> f64 {
        self.inlet_radius
    }

    pub fn outlet_radius(&self) -> f64 {
        self.outlet_radius
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Elasticity coefficient f
    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// df/dR
    pub fn elasticity_derivative(&self) -> f64 {
        self.elasticity_derivative
    }

    pub fn reynolds(&self) -> f64 {
        self.reynolds
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn dx(&self) -> f64 {
        self.grid.dx
    }

    pub fn unstressed_area(&self) -> &[f64] {
        &self.grid.unstressed_area
    }

    /// Current state
    pub fn state(&self) -> Result<&VesselState> {
        self.solution.as_ref().map(|s| &s.current).ok_or_else(|| {
            SimulationError::configuration(format!("artery {} has no initial conditions", self.position))
        })
    }

    /// Recorded snapshots, `None` before initial conditions
    pub fn history(&self) -> Option<&History> {
        self.solution.as_ref().map(|s| &s.history)
    }

    /// Fluid volume held by the vessel (trapezoidal rule)
    pub fn volume(&self) -> Result<f64> {
        let state = self.state()?;
        let n = state.points();
        let ends = 0.5 * (state.area(0) + state.area(n - 1)) * self.grid.dx;
        Ok(state.integral(AREA, 1..n - 1, self.grid.dx) + ends)
    }
}

// =================================================================================================
// Conservation law
// =================================================================================================

impl ConservationLaw for Artery {
    fn points(&self) -> usize {
        self.grid.points()
    }

    fn coefficients(&self, node: usize) -> NodeCoefficients {
        NodeCoefficients::new(self.grid.unstressed_area[node], self.grid.radius_gradient[node])
    }

    /// `[q, q²/a + f·sqrt(A0·a)]`
    fn flux(&self, state: &Vector2<f64>, at: &NodeCoefficients) -> Vector2<f64> {
        let (a, q) = (state[0], state[1]);
        Vector2::new(q, q * q / a + self.elasticity * (at.unstressed_area * a).sqrt())
    }

    /// Viscous friction plus wall taper
    fn source(&self, state: &Vector2<f64>, at: &NodeCoefficients) -> Vector2<f64> {
        let (a, q) = (state[0], state[1]);
        let a0 = at.unstressed_area;
        let radius = (a0 / PI).sqrt();
        let f = self.elasticity;
        let df = self.elasticity_derivative;

        let friction = -2.0 * PI * radius * q / (self.reynolds * self.delta * a);
        let taper = (2.0 * a.sqrt() * (PI.sqrt() * f + a0.sqrt() * df) - a * df) * at.radius_gradient;
        Vector2::new(0.0, friction + taper)
    }

    /// `-sqrt(2/3 · 3/4·f · sqrt(A0/a))`
    fn wave_speed(&self, area: f64, at: &NodeCoefficients) -> f64 {
        let stiffness = 3.0 / 4.0 * self.elasticity;
        -(2.0 / 3.0 * stiffness * (at.unstressed_area / area).sqrt()).sqrt()
    }

    fn name(&self) -> &str {
        "Elastic Artery"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
