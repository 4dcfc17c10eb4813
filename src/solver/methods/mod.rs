//! Time-stepping schemes
//!
//! # Available Methods
//!
//! - **[`LaxWendroff`]**: Richtmyer two-step Lax-Wendroff
//!   - Order: second order in space and time
//!   - Cost: 4 flux/source evaluations per node and step
//!   - Stability: explicit, CFL-limited, checked on every interior node
//!
//! A method only sees a [`ConservationLaw`](crate::physics::ConservationLaw),
//! a previous state and two boundary states. It never reads the network or
//! another vessel.

pub mod lax_wendroff;

// Re-exports for convenience
pub use lax_wendroff::LaxWendroff;
