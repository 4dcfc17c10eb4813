//! Helper functions for integration tests

use hemo_rs::models::{Artery, ArteryParameters, WallModel};
use hemo_rs::physics::VesselState;

/// Constant stiffness `f`, no taper
pub fn artery_parameters(elasticity: f64, length_ratio: f64, reynolds: f64, delta: f64) -> ArteryParameters {
    ArteryParameters::new(WallModel::constant(elasticity), length_ratio, reynolds, delta)
}

/// Meshed vessel of unit radius, without initial conditions
pub fn uniform_artery(parameters: &ArteryParameters, points: usize) -> Artery {
    let mut artery = Artery::new(0, 0, 1.0, 1.0, parameters).unwrap();
    artery.mesh(points).unwrap();
    artery
}

/// Periodic ghost nodes on a grid of `m + 2` nodes
///
/// Node 0 mirrors node `m` and node `m + 1` mirrors node 1, so nodes
/// `1..=m` cover exactly one period.
pub fn apply_periodic_ghosts(state: &mut VesselState) {
    let m = state.points() - 2;
    let (first, last) = (state.node(m), state.node(1));
    state.set_node(0, &first);
    state.set_node(m + 1, &last);
}

/// Root mean square difference of two equally long series
pub fn l2_error(computed: &[f64], reference: &[f64]) -> f64 {
    assert_eq!(computed.len(), reference.len(), "series length mismatch");
    let sum: f64 = computed
        .iter()
        .zip(reference)
        .map(|(a, b)| (a - b).powi(2))
        .sum();
    (sum / computed.len() as f64).sqrt()
}

/// Relative error |computed - expected| / |expected|
pub fn relative_error(computed: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-15 {
        computed.abs()
    } else {
        (computed - expected).abs() / expected.abs()
    }
}
