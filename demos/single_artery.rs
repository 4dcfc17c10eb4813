//! Example: Single artery driven by a periodic inflow
//!
//! Simulates one tapered vessel over several cardiac cycles and exports the
//! last cycle to CSV.
//!
//! **Physical System** (non-dimensional):
//! - Vessel: radius 1 → 0.8, length 20 radii
//! - Wall: constant stiffness f = 100 (wave speed ≈ 7.07)
//! - Inflow: u(t) = 0.02 + 0.015·sin(2πt/T), T = 2
//! - Outlet: distal pressure 0
//!
//! Run with:
//!
//! ```bash
//! RUST_LOG=info cargo run --example single_artery
//! ```

use hemo_rs::models::{ArteryParameters, InflowWaveform, NetworkParameters, WallModel};
use hemo_rs::output::{CsvConfig, CsvExporter, CsvMetadata, ResultSink};
use hemo_rs::physics::StateQuantity;
use hemo_rs::solver::{ArteryNetwork, LogObserver, TimeConfiguration};

use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("═══════════════════════════════════════════════════════");
    println!("  Single Artery - Periodic Inflow");
    println!("═══════════════════════════════════════════════════════\n");

    // ====== Parameters ======

    let elasticity = 100.0;
    let reynolds = 100.0;
    let delta = 0.1;
    let points = 81;
    let period = 2.0;
    let cycles = 4;

    let artery = ArteryParameters::new(WallModel::constant(elasticity), 20.0, reynolds, delta);
    let tree = NetworkParameters::new(1, 1.0, 0.9, 0.6, artery).tapered(0.8);

    let mut network = ArteryNetwork::new(&tree)?;
    network.mesh(points)?;

    // Courant number 0.5 at rest
    let dx = network.arteries()[0].dx();
    let dt = 0.5 * dx / (elasticity / 2.0).sqrt();
    network.set_time(TimeConfiguration::periodic(dt, period, cycles, 101))?;
    network.initial_conditions(0.0)?;

    println!("Grid:  {} nodes, dx = {:.4}", points, dx);
    println!("Time:  dt = {:.4e}, {} steps\n", dt, network.timing()?.time_steps);

    // ====== Run ======

    let inflow = InflowWaveform::sinusoidal(0.02, 0.015, period);
    let start = Instant::now();
    network.solve(&inflow, 0.0, &mut LogObserver::new())?;
    println!("Solved in {:.2?}\n", start.elapsed());

    // ====== Results ======

    let vessel = &network.arteries()[0];
    let history = vessel.history().ok_or("no history recorded")?;
    let inlet = history.trace(StateQuantity::Pressure, 0);
    let outlet = history.trace(StateQuantity::Flow, points - 1);

    let max = |values: &[f64]| values.iter().copied().fold(f64::MIN, f64::max);
    let min = |values: &[f64]| values.iter().copied().fold(f64::MAX, f64::min);
    println!("Last cycle:");
    println!("  inlet pressure  : {:.4e} .. {:.4e}", min(&inlet), max(&inlet));
    println!("  outlet flow     : {:.4e} .. {:.4e}", min(&outlet), max(&outlet));

    // ====== Export ======

    std::fs::create_dir_all("output")?;
    let mut metadata = CsvMetadata::from_network(&network)?;
    metadata.add_custom("Inflow", "0.02 + 0.015 sin(2 pi t / 2)");
    let exporter = CsvExporter::new(CsvConfig::default().with_metadata(metadata));
    let files = exporter.export_network(&network, "single", "output")?;

    println!("\nWrote {} files to output/", files.len());
    Ok(())
}
