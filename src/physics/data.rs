//! Vessel state containers
//!
//! - [`VesselState`]: the solution at one time level, a 2×nx array of
//!   (area, flow) pairs stored in a nalgebra matrix
//! - [`InitialCondition`]: one equation's initial field
//! - [`History`]: the reduced-resolution record of a run, stored as ndarray
//!   arrays of shape (2, ntr, nx) for the state and (ntr, nx) for the pressure

use crate::error::{Result, SimulationError};
use crate::physics::traits::StateQuantity;
use nalgebra::{DMatrix, Vector2};
use ndarray::{Array2, Array3, ArrayView2, s};
use std::fmt;
use std::ops::Range;

/// Row holding the cross-sectional area
pub const AREA: usize = 0;

/// Row holding the flow rate
pub const FLOW: usize = 1;

/// Number of conserved equations
pub const EQUATIONS: usize = 2;

// =================================================================================================
// Vessel State
// =================================================================================================

/// Solution of one vessel at one time level
///
/// # Memory Layout
///
/// Column-major 2×nx matrix: column `j` holds `(a_j, q_j)`, so a node is a
/// contiguous pair and a 3-node stencil is a contiguous 2×3 block.
///
/// # Example
///
/// ```rust
/// use hemo_rs::physics::VesselState;
///
/// let state = VesselState::uniform(5, 3.0, 0.5);
/// assert_eq!(state.points(), 5);
/// assert_eq!(state.velocity(2), 0.5 / 3.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VesselState {
    values: DMatrix<f64>,
}

impl VesselState {
    /// All-zero state
    pub fn zeros(points: usize) -> Self {
        Self {
            values: DMatrix::zeros(EQUATIONS, points),
        }
    }

    /// Uniform area and flow
    pub fn uniform(points: usize, area: f64, flow: f64) -> Self {
        let mut values = DMatrix::zeros(EQUATIONS, points);
        values.row_mut(AREA).fill(area);
        values.row_mut(FLOW).fill(flow);
        Self { values }
    }

    /// Build from explicit area and flow profiles
    pub fn from_profiles(area: &[f64], flow: &[f64]) -> Result<Self> {
        if area.len() != flow.len() {
            return Err(SimulationError::configuration(format!(
                "area profile has {} nodes but flow profile has {}",
                area.len(),
                flow.len()
            )));
        }

        let mut values = DMatrix::zeros(EQUATIONS, area.len());
        for (j, (&a, &q)) in area.iter().zip(flow).enumerate() {
            values[(AREA, j)] = a;
            values[(FLOW, j)] = q;
        }
        Ok(Self { values })
    }

    /// Build from one initial condition per equation
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when the number of conditions is not
    /// exactly two (area and flow) or when a profile does not have `points` entries.
    pub fn from_initial_conditions(conditions: &[InitialCondition], points: usize) -> Result<Self> {
        if conditions.len() != EQUATIONS {
            return Err(SimulationError::configuration(format!(
                "{} initial conditions supplied, {} expected",
                conditions.len(),
                EQUATIONS
            )));
        }

        let mut values = DMatrix::zeros(EQUATIONS, points);
        for (row, condition) in conditions.iter().enumerate() {
            match condition {
                InitialCondition::Uniform(value) => values.row_mut(row).fill(*value),
                InitialCondition::Profile(profile) => {
                    if profile.len() != points {
                        return Err(SimulationError::configuration(format!(
                            "initial condition {} has {} values, mesh has {} nodes",
                            row,
                            profile.len(),
                            points
                        )));
                    }
                    for (j, value) in profile.iter().enumerate() {
                        values[(row, j)] = *value;
                    }
                }
            }
        }
        Ok(Self { values })
    }

    /// Number of grid nodes
    pub fn points(&self) -> usize {
        self.values.ncols()
    }

    /// Area at node `j`
    #[inline]
    pub fn area(&self, j: usize) -> f64 {
        self.values[(AREA, j)]
    }

    /// Flow rate at node `j`
    #[inline]
    pub fn flow(&self, j: usize) -> f64 {
        self.values[(FLOW, j)]
    }

    /// Mean velocity q/a at node `j`
    #[inline]
    pub fn velocity(&self, j: usize) -> f64 {
        self.flow(j) / self.area(j)
    }

    /// (area, flow) pair at node `j`
    #[inline]
    pub fn node(&self, j: usize) -> Vector2<f64> {
        Vector2::new(self.values[(AREA, j)], self.values[(FLOW, j)])
    }

    /// Overwrite node `j`
    #[inline]
    pub fn set_node(&mut self, j: usize, value: &Vector2<f64>) {
        self.values[(AREA, j)] = value[0];
        self.values[(FLOW, j)] = value[1];
    }

    /// First node
    pub fn first(&self) -> Vector2<f64> {
        self.node(0)
    }

    /// Last node
    pub fn last(&self) -> Vector2<f64> {
        self.node(self.points() - 1)
    }

    /// Copy of the area row
    pub fn areas(&self) -> Vec<f64> {
        self.values.row(AREA).iter().copied().collect()
    }

    /// Copy of the flow row
    pub fn flows(&self) -> Vec<f64> {
        self.values.row(FLOW).iter().copied().collect()
    }

    /// Underlying 2×nx matrix
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Sum of `row` over `nodes`, times `dx` (discrete integral)
    ///
    /// With `row = AREA` this is the fluid volume held by the nodes.
    pub fn integral(&self, row: usize, nodes: Range<usize>, dx: f64) -> f64 {
        nodes.map(|j| self.values[(row, j)]).sum::<f64>() * dx
    }

    /// True when any entry is NaN or infinite
    pub fn has_non_finite(&self) -> bool {
        self.values.iter().any(|x| !x.is_finite())
    }
}

impl fmt::Display for VesselState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VesselState [2 * {}]", self.points())
    }
}

// =================================================================================================
// Initial conditions
// =================================================================================================

/// Initial field for one equation
#[derive(Debug, Clone, PartialEq)]
pub enum InitialCondition {
    /// Same value on every node
    Uniform(f64),

    /// One value per node
    Profile(Vec<f64>),
}

// =================================================================================================
// History
// =================================================================================================

/// Reduced-resolution record of a vessel
///
/// Only `records` snapshots are kept, whatever the number of time steps.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    /// (2, ntr, nx): area and flow snapshots
    states: Array3<f64>,

    /// (ntr, nx): pressure snapshots
    pressure: Array2<f64>,
}

impl History {
    /// Zero-filled history for `records` snapshots of `points` nodes
    pub fn new(records: usize, points: usize) -> Self {
        Self {
            states: Array3::zeros((EQUATIONS, records, points)),
            pressure: Array2::zeros((records, points)),
        }
    }

    /// Number of snapshots
    pub fn records(&self) -> usize {
        self.pressure.nrows()
    }

    /// Number of grid nodes
    pub fn points(&self) -> usize {
        self.pressure.ncols()
    }

    /// Store a snapshot at `index`
    ///
    /// Fails when `index` is outside the buffer or the state does not match
    /// the buffer width.
    pub fn record(&mut self, index: usize, state: &VesselState, pressure: &[f64]) -> Result<()> {
        if index >= self.records() {
            return Err(SimulationError::configuration(format!(
                "snapshot index {} out of range, history holds {} records",
                index,
                self.records()
            )));
        }
        if state.points() != self.points() || pressure.len() != self.points() {
            return Err(SimulationError::configuration(format!(
                "snapshot of {} nodes does not fit a history of {} nodes",
                state.points(),
                self.points()
            )));
        }

        for j in 0..state.points() {
            self.states[[AREA, index, j]] = state.area(j);
            self.states[[FLOW, index, j]] = state.flow(j);
        }
        self.pressure
            .row_mut(index)
            .iter_mut()
            .zip(pressure)
            .for_each(|(slot, p)| *slot = *p);
        Ok(())
    }

    /// (ntr, nx) view of one recorded quantity
    pub fn quantity(&self, quantity: StateQuantity) -> ArrayView2<'_, f64> {
        match quantity.row() {
            Some(row) => self.states.slice(s![row, .., ..]),
            None => self.pressure.view(),
        }
    }

    /// Time trace of `quantity` at node `node`
    pub fn trace(&self, quantity: StateQuantity, node: usize) -> Vec<f64> {
        self.quantity(quantity).column(node).to_vec()
    }

    /// Snapshot `index` as a state
    pub fn snapshot(&self, index: usize) -> VesselState {
        let area = self.states.slice(s![AREA, index, ..]).to_vec();
        let flow = self.states.slice(s![FLOW, index, ..]).to_vec();
        VesselState {
            values: DMatrix::from_fn(EQUATIONS, area.len(), |row, j| {
                if row == AREA { area[j] } else { flow[j] }
            }),
        }
    }

    /// Full (2, ntr, nx) state array
    pub fn states(&self) -> &Array3<f64> {
        &self.states
    }

    /// Full (ntr, nx) pressure array
    pub fn pressure(&self) -> &Array2<f64> {
        &self.pressure
    }
}

// ==================== Tests ====================
