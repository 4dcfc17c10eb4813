//! Vessel and network parameters
//!
//! Plain typed structures filled by the caller (or by an external loader with
//! the `serde` feature). Each one validates itself before a network is built.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::models::elasticity::WallModel;

/// Material and flow parameters shared by every vessel of a network
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArteryParameters {
    /// Wall stiffness law
    pub wall: WallModel,

    /// Vessel length divided by its inlet radius (λ)
    pub length_ratio: f64,

    /// Reynolds number
    pub reynolds: f64,

    /// Boundary-layer thickness ratio δ
    pub delta: f64,
}

impl ArteryParameters {
    /// Create parameters
    pub fn new(wall: WallModel, length_ratio: f64, reynolds: f64, delta: f64) -> Self {
        Self {
            wall,
            length_ratio,
            reynolds,
            delta,
        }
    }

    /// Validate parameters for a vessel of inlet radius `radius`
    pub fn validate(&self, radius: f64) -> Result<()> {
        if !(self.length_ratio > 0.0 && self.length_ratio.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "length ratio must be positive, got {}",
                self.length_ratio
            )));
        }
        if !(self.reynolds > 0.0 && self.reynolds.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "Reynolds number must be positive, got {}",
                self.reynolds
            )));
        }
        if !(self.delta > 0.0 && self.delta.is_finite()) {
            return Err(SimulationError::configuration(format!(
                "boundary-layer thickness ratio must be positive, got {}",
                self.delta
            )));
        }
        self.wall.validate(radius)
    }
}

/// Deepest tree a network may hold (about a million vessels)
pub const MAX_DEPTH: usize = 20;

/// Shape of a symmetric binary bifurcation tree
///
/// Each parent spawns two daughters whose radii are the parent's scaled by
/// `scale_a` and `scale_b`. Vessels may taper between `inlet_radius` and
/// `outlet_radius` (the root's values; daughters scale both).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkParameters {
    /// Number of generations (1 = single vessel)
    pub depth: usize,

    /// Root inlet radius
    pub inlet_radius: f64,

    /// Root outlet radius
    pub outlet_radius: f64,

    /// Radius ratio of the first daughter
    pub scale_a: f64,

    /// Radius ratio of the second daughter
    pub scale_b: f64,

    /// Parameters shared by all vessels
    pub artery: ArteryParameters,
}

impl NetworkParameters {
    /// Untapered tree with root radius `radius`
    pub fn new(depth: usize, radius: f64, scale_a: f64, scale_b: f64, artery: ArteryParameters) -> Self {
        Self {
            depth,
            inlet_radius: radius,
            outlet_radius: radius,
            scale_a,
            scale_b,
            artery,
        }
    }

    /// Builder pattern: taper the root towards `outlet_radius`
    pub fn tapered(mut self, outlet_radius: f64) -> Self {
        self.outlet_radius = outlet_radius;
        self
    }

    /// Number of vessels, 2^depth - 1
    pub fn vessel_count(&self) -> usize {
        (1usize << self.depth) - 1
    }

    /// Number of terminal vessels, 2^(depth - 1)
    pub fn leaf_count(&self) -> usize {
        1usize << (self.depth - 1)
    }

    /// Validate
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(SimulationError::configuration("tree depth must be at least 1"));
        }
        if self.depth > MAX_DEPTH {
            return Err(SimulationError::configuration(format!(
                "tree depth {} is too large, at most {} generations are supported",
                self.depth, MAX_DEPTH
            )));
        }
        for (name, radius) in [("inlet", self.inlet_radius), ("outlet", self.outlet_radius)] {
            if !(radius > 0.0 && radius.is_finite()) {
                return Err(SimulationError::configuration(format!(
                    "{} radius must be positive, got {}",
                    name, radius
                )));
            }
        }
        if self.depth > 1 {
            for (name, scale) in [("a", self.scale_a), ("b", self.scale_b)] {
                if !(scale > 0.0 && scale.is_finite()) {
                    return Err(SimulationError::configuration(format!(
                        "bifurcation scale factor {} must be positive, got {}",
                        name, scale
                    )));
                }
            }
        }
        self.artery.validate(self.inlet_radius)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
