//! Numerical solvers
//!
//! This module turns the vessel equations of [`crate::physics`] into a time
//! march over a network of arteries.
//!
//! # Module Organization
//!
//! - **`traits`**: time settings and results
//!   - [`TimeConfiguration`]: dt, number of steps, snapshots, inflow period
//!   - [`RecordSchedule`]: which time levels are stored
//!   - [`SimulationResult`]: trajectory of a standalone run
//!
//! - **`boundary`**: characteristic inlet and outlet states, CFL checks
//!
//! - **`methods`**: the integrators
//!   - [`LaxWendroff`]: Richtmyer two-step Lax-Wendroff
//!
//! - **`network`**: [`ArteryNetwork`], the binary tree and its global clock
//!
//! - **`observer`**: progress callbacks ([`SimulationObserver`])
//!
//! # Workflow
//!
//! ```text
//! NetworkParameters ──► ArteryNetwork::new      (tree of Artery)
//!                             │
//!                        mesh(nx)               (grid, A0(x), dR/dx)
//!                             │
//!                        set_time(...)          (dt, nt, ntr, T)
//!                             │
//!                        initial_conditions(q0) (state + history buffers)
//!                             │
//!                        solve(inflow, p_out)   ──► per-vessel History
//! ```
//!
//! # Error Handling
//!
//! Every operation returns [`crate::Result`]. A numerical failure during the
//! march (non-positive area, Courant number above one, boundary without a
//! real root, NaN) is a [`SimulationError::StabilityViolation`] carrying the
//! time step and node; the run stops there.
//!
//! [`SimulationError::StabilityViolation`]: crate::SimulationError::StabilityViolation

// =================================================================================================
// Module Declarations
// =================================================================================================
pub mod boundary;
pub mod methods;
mod network;
mod observer;
mod traits;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Below this number of vessels one network step is integrated sequentially
// even with the `parallel` feature. The value is read on every step, hence
// the atomic.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of vessels from which a network step runs on the rayon pool.
///
/// Depth 4 (15 vessels) and shallower trees stay sequential: a vessel step on
/// a typical grid is a few microseconds, less than the dispatch cost.
const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold (in vessels).
///
/// Only consulted when the crate is compiled with the `parallel` feature.
///
/// # Example
///
/// ```rust
/// use hemo_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`.
///
/// # Example
///
/// ```rust
/// use hemo_rs::solver::{parallel_threshold, set_parallel_threshold};
///
/// let previous = parallel_threshold();
/// set_parallel_threshold(64);
/// assert_eq!(parallel_threshold(), 64);
///
/// set_parallel_threshold(previous);
/// ```
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that sets the threshold and restores the previous value on drop.
///
/// ```rust,ignore
/// let _guard = crate::solver::ThresholdGuard::save(2);
/// ```
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{RecordSchedule, SimulationResult, TimeConfiguration};

pub use boundary::{
    bifurcation_boundary, cfl_check, check_courant, extrapolate, inlet_boundary, outlet_boundary, periodic,
};
pub use methods::LaxWendroff;
pub use network::ArteryNetwork;
pub use observer::{LogObserver, NullObserver, SimulationObserver};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::error::{Result, SimulationError};
use crate::physics::VesselState;

/// Reject states holding NaN or infinite values
///
/// The error names the first offending node.
///
/// ```rust,ignore
/// validate_state(&state, 42)?;
/// ```
pub(crate) fn validate_state(state: &VesselState, step: usize) -> Result<()> {
    for j in 0..state.points() {
        let (area, flow) = (state.area(j), state.flow(j));
        if !(area.is_finite() && flow.is_finite()) {
            return Err(SimulationError::stability(
                step,
                j,
                format!("non-finite state (a = {}, q = {})", area, flow),
            ));
        }
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
