//! Convergence tests for the Lax-Wendroff integrator
//!
//! Both tests refine the grid at a fixed Courant number; a second-order
//! scheme divides the error by about four per halving of dx.

use hemo_rs::physics::VesselState;
use hemo_rs::solver::LaxWendroff;
use nalgebra::Vector2;
use std::f64::consts::PI;

mod common;
use common::{apply_periodic_ghosts, artery_parameters, l2_error, uniform_artery, LinearAdvection};

// =================================================================================================
// Linear advection against the exact solution
// =================================================================================================

fn advection_profile(x: f64) -> Vector2<f64> {
    Vector2::new(1.0 + 0.2 * (2.0 * PI * x).sin(), 0.5 * (2.0 * PI * x).cos())
}

/// RMS error after one period crossing on `m` periodic cells of [0, 1)
fn advection_error(m: usize) -> f64 {
    let speed = 1.0;
    let total_time = 1.0;
    let dx = 1.0 / m as f64;
    let steps = (total_time / (0.5 * dx / speed)).round() as usize;
    let dt = total_time / steps as f64;

    let law = LinearAdvection::new(m + 2, speed);
    let integrator = LaxWendroff::new(dt, dx).unwrap();

    let x = |j: usize| (j as f64 - 1.0) * dx;
    let area: Vec<f64> = (0..m + 2).map(|j| advection_profile(x(j))[0]).collect();
    let flow: Vec<f64> = (0..m + 2).map(|j| advection_profile(x(j))[1]).collect();
    let mut state = VesselState::from_profiles(&area, &flow).unwrap();
    apply_periodic_ghosts(&mut state);

    for k in 1..=steps {
        state = integrator
            .step(&law, &state, &state.first(), &state.last(), k)
            .unwrap();
        apply_periodic_ghosts(&mut state);
    }

    let mut computed = Vec::with_capacity(2 * m);
    let mut exact = Vec::with_capacity(2 * m);
    for j in 1..=m {
        let expected = law.exact(advection_profile, x(j), total_time);
        computed.extend([state.area(j), state.flow(j)]);
        exact.extend([expected[0], expected[1]]);
    }
    // Sum over both components, as a per-node norm
    l2_error(&computed, &exact) * 2f64.sqrt()
}

#[test]
fn test_advection_second_order_convergence() {
    let errors: Vec<f64> = [20, 40, 80, 160].iter().map(|&m| advection_error(m)).collect();

    for i in 0..errors.len() - 1 {
        let ratio = errors[i] / errors[i + 1];
        println!("Advection convergence ratio {}->{}: {}", i, i + 1, ratio);
        assert!(
            ratio > 3.5 && ratio < 4.5,
            "Convergence ratio {} not second-order",
            ratio
        );
    }
}

// =================================================================================================
// Artery self-convergence
// =================================================================================================

/// Periodic artery state after `total_time` on `m` cells of one 20-radius period
///
/// Returns the area and flow on the `m` periodic nodes.
fn artery_solution(m: usize) -> (Vec<f64>, Vec<f64>) {
    let period = 20.0;
    let total_time = 0.5;
    let courant = 0.4;
    let elasticity: f64 = 100.0;

    // m + 2 nodes with dx = period / m
    let parameters = artery_parameters(elasticity, period * (m + 1) as f64 / m as f64, 1000.0, 0.1);
    let artery = uniform_artery(&parameters, m + 2);
    let dx = artery.dx();

    let c0 = (elasticity / 2.0).sqrt();
    let steps = (total_time / (courant * dx / c0)).round() as usize;
    let integrator = LaxWendroff::new(total_time / steps as f64, dx).unwrap();

    let x = |j: usize| (j as f64 - 1.0) * dx;
    let area: Vec<f64> = (0..m + 2)
        .map(|j| PI * (1.0 + 0.05 * (2.0 * PI * x(j) / period).sin()))
        .collect();
    let flow: Vec<f64> = (0..m + 2)
        .map(|j| 0.2 * (2.0 * PI * x(j) / period).cos())
        .collect();
    let mut state = VesselState::from_profiles(&area, &flow).unwrap();
    apply_periodic_ghosts(&mut state);

    for k in 1..=steps {
        state = integrator
            .step(&artery, &state, &state.first(), &state.last(), k)
            .unwrap();
        apply_periodic_ghosts(&mut state);
    }

    (
        (1..=m).map(|j| state.area(j)).collect(),
        (1..=m).map(|j| state.flow(j)).collect(),
    )
}

#[test]
fn test_artery_self_convergence() {
    let reference_cells = 640;
    let (reference_area, reference_flow) = artery_solution(reference_cells);

    let mut errors = Vec::new();
    for m in [40, 80, 160] {
        let stride = reference_cells / m;
        let (area, flow) = artery_solution(m);

        let computed: Vec<f64> = area.iter().chain(&flow).copied().collect();
        let reference: Vec<f64> = (0..m)
            .map(|j| reference_area[j * stride])
            .chain((0..m).map(|j| reference_flow[j * stride]))
            .collect();
        errors.push(l2_error(&computed, &reference));
    }

    for i in 0..errors.len() - 1 {
        let ratio = errors[i] / errors[i + 1];
        println!("Artery convergence ratio {}->{}: {}", i, i + 1, ratio);
        assert!(ratio > 3.0 && ratio < 5.5, "Convergence ratio {} not second-order", ratio);
    }
}
