//! Common utilities for integration tests

pub mod mock_models;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_models::LinearAdvection;
pub use test_helpers::{apply_periodic_ghosts, artery_parameters, l2_error, relative_error, uniform_artery};
