//! Conservation laws and state containers
//!
//! This module provides the seam between vessel physics and numerics.
//! A conservation law encapsulates the equations of a 1-D system
//! `U_t + F(U)_x = S(U)` with two unknowns (area and flow rate).
//!
//! # Core Concepts
//!
//! - **Conservation law**: flux, source and wave speed at a grid node
//! - **Vessel state**: the 2×nx solution at one time level
//! - **History**: reduced-resolution snapshots of a run
//!
//! # Architecture
//!
//! Conservation laws are **separate from the integrator**:
//! - The law provides the **equations** (physics)
//! - The integrator provides the **method** to advance them (numerics)
//!
//! This separation allows the same Lax-Wendroff stepper to advance an elastic
//! artery or a linear advection test problem.
//!
//! # Example
//!
//! ```rust
//! use hemo_rs::physics::{ConservationLaw, NodeCoefficients, VesselState};
//! use nalgebra::Vector2;
//!
//! struct Advection;
//!
//! impl ConservationLaw for Advection {
//!     fn points(&self) -> usize { 11 }
//!     fn coefficients(&self, _node: usize) -> NodeCoefficients { NodeCoefficients::default() }
//!     fn flux(&self, u: &Vector2<f64>, _at: &NodeCoefficients) -> Vector2<f64> { *u }
//!     fn source(&self, _u: &Vector2<f64>, _at: &NodeCoefficients) -> Vector2<f64> { Vector2::zeros() }
//!     fn wave_speed(&self, _area: f64, _at: &NodeCoefficients) -> f64 { -1.0 }
//!     fn name(&self) -> &str { "Advection" }
//! }
//!
//! let state = VesselState::uniform(11, 1.0, 0.0);
//! let flux = Advection.flux_range(&state, 0..11);
//! assert_eq!(flux.ncols(), 11);
//! ```

// module declaration
pub mod data;
pub mod traits;

// re-export commonly used types for convenience
pub use data::{History, InitialCondition, VesselState, AREA, EQUATIONS, FLOW};
pub use traits::{ConservationLaw, NodeCoefficients, StateQuantity};
