//! hemo-rs: One-dimensional blood flow in arterial networks
//!
//! Each artery is a compliant tube described by the area-flow form of the
//! 1-D blood flow equations, integrated with the Richtmyer two-step
//! Lax-Wendroff scheme. Arteries are arranged in a symmetric binary tree driven
//! by an inflow waveform at the root and a distal pressure at the leaves.
//!
//! # Architecture
//!
//! hemo-rs separates physics and numerics:
//!
//! - [`physics`]: the conservation-law seam ([`physics::ConservationLaw`]) and
//!   the state containers
//! - [`models`]: the elastic artery, the wall law, inflow waveforms and
//!   parameters (what is solved)
//! - [`solver`]: the Lax-Wendroff integrator, characteristic boundary
//!   conditions and the network orchestrator (how it is solved)
//! - [`output`]: export of the recorded histories
//!
//! # Quick Start
//!
//! ```rust
//! use hemo_rs::prelude::*;
//!
//! # fn main() -> hemo_rs::Result<()> {
//! // Single vessel, constant wall stiffness, step inflow
//! let artery = ArteryParameters::new(WallModel::constant(100.0), 20.0, 10.0, 0.1);
//! let mut network = ArteryNetwork::new(&NetworkParameters::new(1, 1.0, 0.9, 0.6, artery))?;
//!
//! network.mesh(41)?;
//! network.set_time(TimeConfiguration::fixed(400, 0.05, 21))?;
//! network.initial_conditions(0.0)?;
//! network.solve(&InflowWaveform::step(0.0, 0.0, 0.01), 0.0, &mut NullObserver)?;
//!
//! let history = network.arteries()[0].history().unwrap();
//! let inlet_pressure = history.trace(StateQuantity::Pressure, 0);
//! assert!(inlet_pressure[20] > 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `parallel`: integrate the vessels of one time step on the rayon pool
//! - `serde`: `Serialize`/`Deserialize` on the parameter structs

pub mod error;
pub mod models;
pub mod output;
pub mod physics;
pub mod solver;

pub use error::{Result, SimulationError};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use hemo_rs::prelude::*;
    //! ```
    pub use crate::error::{Result, SimulationError};
    pub use crate::models::{Artery, ArteryParameters, InflowWaveform, NetworkParameters, WallModel};
    pub use crate::physics::{ConservationLaw, History, InitialCondition, StateQuantity, VesselState};
    pub use crate::solver::{
        ArteryNetwork, LaxWendroff, LogObserver, NullObserver, SimulationObserver, SimulationResult,
        TimeConfiguration,
    };
}
