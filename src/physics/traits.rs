//! Conservation law traits and types
//!
//! This module defines the core API between vessel models and the integrator:
//! - `ConservationLaw`: flux, source and characteristic speeds of a 2×2 system
//! - `NodeCoefficients`: static per-node data the flux and source depend on
//! - `StateQuantity`: type-safe identifiers for the recorded fields

use crate::physics::data::VesselState;
use nalgebra::{DMatrix, Vector2};
use std::fmt;
use std::ops::Range;

// =================================================================================================
// State quantities (Type-safe Identifiers)
// =================================================================================================

/// Quantities stored for every grid node
///
/// `Area` and `Flow` are the conserved variables integrated in time (rows 0 and 1
/// of a [`VesselState`]); `Pressure` is derived from the area through the wall law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateQuantity {
    /// Cross-sectional area
    Area,

    /// Volumetric flow rate
    Flow,

    /// Transmural pressure (divided by density)
    Pressure,
}

impl StateQuantity {
    /// Row of the quantity in a state array, `None` for derived quantities
    pub fn row(&self) -> Option<usize> {
        match self {
            StateQuantity::Area => Some(0),
            StateQuantity::Flow => Some(1),
            StateQuantity::Pressure => None,
        }
    }

    /// One-letter prefix used for result files
    pub fn symbol(&self) -> &'static str {
        match self {
            StateQuantity::Area => "a",
            StateQuantity::Flow => "q",
            StateQuantity::Pressure => "p",
        }
    }
}

impl fmt::Display for StateQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateQuantity::Area => write!(f, "Area"),
            StateQuantity::Flow => write!(f, "Flow"),
            StateQuantity::Pressure => write!(f, "Pressure"),
        }
    }
}

// =================================================================================================
// Node coefficients
// =================================================================================================

/// Static coefficients attached to a grid node
///
/// Flux and source of a vessel depend on the local unstressed area `A0` and on
/// the axial gradient of the unstressed radius (wall taper). Both are fixed once
/// the vessel is meshed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeCoefficients {
    /// Unstressed cross-sectional area A0
    pub unstressed_area: f64,

    /// dR0/dx
    pub radius_gradient: f64,
}

impl NodeCoefficients {
    /// Create coefficients for one node
    pub fn new(unstressed_area: f64, radius_gradient: f64) -> Self {
        Self {
            unstressed_area,
            radius_gradient,
        }
    }

    /// Coefficients halfway between two nodes (used for the predicted half-step states)
    pub fn midpoint(&self, other: &Self) -> Self {
        Self {
            unstressed_area: 0.5 * (self.unstressed_area + other.unstressed_area),
            radius_gradient: 0.5 * (self.radius_gradient + other.radius_gradient),
        }
    }
}

// =================================================================================================
// Conservation law trait
// =================================================================================================

/// A one-dimensional 2×2 balance law `U_t + F(U)_x = S(U)`
///
/// # Responsibility
///
/// Provides the flux `F`, the source `S` and the characteristic speeds at a
/// single node. It does NOT advance anything in time (that is the integrator's
/// job), so the same law can be stepped by any scheme, and the same scheme can
/// step any law (arteries, linear advection in tests, ...).
///
/// # Addressing
///
/// Every evaluation takes an explicit node (through its [`NodeCoefficients`]).
/// Whole slices are evaluated with [`ConservationLaw::flux_range`] and
/// [`ConservationLaw::source_range`], which always receive an explicit index
/// range; a single node is simply the range `j..j + 1`.
pub trait ConservationLaw: Send + Sync {
    /// Number of grid nodes
    fn points(&self) -> usize;

    /// Static coefficients at `node`
    fn coefficients(&self, node: usize) -> NodeCoefficients;

    /// Conservative flux F(U)
    fn flux(&self, state: &Vector2<f64>, at: &NodeCoefficients) -> Vector2<f64>;

    /// Source term S(U)
    fn source(&self, state: &Vector2<f64>, at: &NodeCoefficients) -> Vector2<f64>;

    /// Local wave speed for the given area
    ///
    /// Returned with a **negative** sign by convention; boundary formulas rely
    /// on it.
    fn wave_speed(&self, area: f64, at: &NodeCoefficients) -> f64;

    /// Name of the law (used for display and logging)
    fn name(&self) -> &str;

    /// The two characteristic speeds `u + c` and `u - c`, with `u = q / a`
    fn characteristic_speeds(&self, state: &Vector2<f64>, at: &NodeCoefficients) -> (f64, f64) {
        let velocity = state[1] / state[0];
        let c = self.wave_speed(state[0], at);
        (velocity + c, velocity - c)
    }

    /// Coefficients halfway between `left` and `left + 1`
    fn half_coefficients(&self, left: usize) -> NodeCoefficients {
        self.coefficients(left).midpoint(&self.coefficients(left + 1))
    }

    /// Flux evaluated on a contiguous node range (one column per node)
    fn flux_range(&self, state: &VesselState, nodes: Range<usize>) -> DMatrix<f64> {
        evaluate_range(state, nodes, |u, at| self.flux(u, at), |j| self.coefficients(j))
    }

    /// Source evaluated on a contiguous node range (one column per node)
    fn source_range(&self, state: &VesselState, nodes: Range<usize>) -> DMatrix<f64> {
        evaluate_range(state, nodes, |u, at| self.source(u, at), |j| self.coefficients(j))
    }
}

fn evaluate_range<E, C>(state: &VesselState, nodes: Range<usize>, evaluate: E, coefficients: C) -> DMatrix<f64>
where
    E: Fn(&Vector2<f64>, &NodeCoefficients) -> Vector2<f64>,
    C: Fn(usize) -> NodeCoefficients,
{
    let start = nodes.start;
    let mut out = DMatrix::zeros(2, nodes.len());
    for j in nodes {
        let value = evaluate(&state.node(j), &coefficients(j));
        out.set_column(j - start, &value);
    }
    out
}

// =================================================================================================
// Tests
// =================================================================================================
