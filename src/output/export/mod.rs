//! Export of recorded vessel histories
//!
//! # Architecture
//!
//! [`ResultSink`] abstracts the output format. Each format is an independent
//! implementation in its own sub-module, so adding a format means adding a
//! file.
//!
//! | Format | Module    |
//! |--------|-----------|
//! | CSV    | [`csv`]   |
//!
//! # Usage example
//!
//! ```rust,ignore
//! use hemo_rs::output::export::{CsvExporter, ResultSink};
//!
//! let exporter = CsvExporter::default();
//!
//! // One vessel
//! exporter.export_vessel(&network.arteries()[0], &network.record_times()?, "root", "out/".as_ref())?;
//!
//! // The whole tree
//! exporter.export_network(&network, "run", "out/")?;
//! ```

pub mod csv;

pub use csv::{CsvConfig, CsvError, CsvExporter, CsvMetadata};

use std::path::{Path, PathBuf};

use crate::error::SimulationError;
use crate::models::Artery;
use crate::solver::ArteryNetwork;

/// Destination of the per-vessel histories
///
/// Each vessel hands over its (2, ntr, nx) state history and its (ntr, nx)
/// pressure history together with the `ntr` snapshot times.
pub trait ResultSink {
    /// Error type specific to this format
    type Error: std::error::Error + From<SimulationError>;

    /// Write the histories of one vessel into `directory`
    ///
    /// Returns the paths written.
    fn export_vessel(
        &self,
        artery: &Artery,
        times: &[f64],
        suffix: &str,
        directory: &Path,
    ) -> Result<Vec<PathBuf>, Self::Error>;

    /// Write every vessel of `network`, snapshot times from
    /// [`ArteryNetwork::record_times`]
    fn export_network(
        &self,
        network: &ArteryNetwork,
        suffix: &str,
        directory: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, Self::Error> {
        let times = network.record_times()?;
        let mut written = Vec::new();
        for artery in network.arteries() {
            written.extend(self.export_vessel(artery, &times, suffix, directory.as_ref())?);
        }
        log::info!("Exported {} vessels ({} files)", network.len(), written.len());
        Ok(written)
    }
}
