//! Vessel models and their parameters
//!
//! [`Artery`] implements the [`ConservationLaw`](crate::physics::ConservationLaw)
//! trait. The integrator calls its flux and source on 3-node stencils; the
//! network calls its constitutive relations (pressure, wave speed) at single
//! nodes when building boundary states.
//!
//! # Contents
//!
//! ## [`Artery`]: one elastic vessel
//!
//! Geometry, mesh, state and history of a single segment, with the flux
//! `[q, q²/a + f·sqrt(A0·a)]` and the friction plus taper source term.
//!
//! ## [`WallModel`]: stiffness law
//!
//! Three-parameter exponential law giving the elasticity coefficient `f` and
//! its radial derivative `df`.
//!
//! ## [`InflowWaveform`]: inlet forcing
//!
//! Prescribed velocity at the root inlet as a function of time.
//!
//! ## Parameters
//!
//! [`ArteryParameters`] and [`NetworkParameters`] collect the inputs of a run
//! and validate them before anything is built.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod artery;
pub mod elasticity;
pub mod inflow;
pub mod parameters;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use artery::{Artery, Grid};
pub use elasticity::{CharacteristicScales, WallModel};
pub use inflow::InflowWaveform;
pub use parameters::{ArteryParameters, MAX_DEPTH, NetworkParameters};
