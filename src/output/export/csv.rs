//! CSV export of recorded vessel histories
//!
//! Every vessel produces three tables, one per recorded quantity:
//!
//! | File                  | Content                  |
//! |-----------------------|--------------------------|
//! | `a{pos}_{suffix}.csv` | cross-sectional area `a` |
//! | `q{pos}_{suffix}.csv` | volumetric flow `q`      |
//! | `p{pos}_{suffix}.csv` | transmural pressure `p`  |
//!
//! Each table has one row per snapshot and one column per grid node,
//! preceded by the snapshot time. The files open in pandas, MATLAB or any
//! spreadsheet.
//!
//! # Example
//!
//! ```rust,ignore
//! use hemo_rs::output::export::{CsvConfig, CsvExporter, CsvMetadata, ResultSink};
//!
//! let metadata = CsvMetadata::from_network(&network)?;
//! let exporter = CsvExporter::new(CsvConfig::default().with_metadata(metadata));
//!
//! // Writes a0_run.csv, q0_run.csv, p0_run.csv, a1_run.csv, ...
//! let files = exporter.export_network(&network, "run", "out/")?;
//! ```
//!
//! **Output** (`p0_run.csv`, with metadata):
//! ```csv
//! # Blood Flow Simulation Data
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Quantity: Pressure (p)
//! # Vessel: 0 (level 0)
//! # Solver: Richtmyer Lax-Wendroff
//! # Time Steps: 3000
//! #
//! t,x=0.000000,x=0.500000,...
//! 0.000000,0.000000,0.000000,...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::SimulationError;
use crate::models::Artery;
use crate::output::export::ResultSink;
use crate::physics::StateQuantity;
use crate::solver::ArteryNetwork;

// =============================================================================
// Errors
// =============================================================================

/// Failures of the CSV sink
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vessel {0} has no recorded history")]
    MissingHistory(usize),

    #[error("{expected} snapshot times expected, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("NaN or Inf in {quantity} of vessel {vessel}, snapshot {record}")]
    NonFinite {
        quantity: StateQuantity,
        vessel: usize,
        record: usize,
    },

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

// =============================================================================
// Configuration Structures
// =============================================================================

/// Configuration for CSV export
///
/// ```rust,ignore
/// let config = CsvConfig {
///     delimiter: ';',
///     precision: 10,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Number of decimal places (default: 6)
    pub precision: usize,

    /// Write the `t,x=...` header row (default: true)
    pub include_header: bool,

    /// Commented metadata block written before the header
    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_header: true,
            metadata: None,
        }
    }
}

impl CsvConfig {
    /// Semicolon delimiter, comma decimal separator
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    /// Twelve decimal places
    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

    /// Bare numeric tables, no header row
    pub fn raw() -> Self {
        Self {
            include_header: false,
            ..Default::default()
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Run description written as `#` comments at the top of each file
///
/// Only the fields that are set are written.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    /// Integrator name (e.g. "Richtmyer Lax-Wendroff")
    pub solver_name: Option<String>,

    pub time_steps: Option<usize>,

    pub dt: Option<f64>,

    /// Inflow period T
    pub period: Option<f64>,

    /// Network depth
    pub depth: Option<usize>,

    /// Additional key/value pairs
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Time settings and depth of a configured network
    pub fn from_network(network: &ArteryNetwork) -> Result<Self, CsvError> {
        let timing = network.timing()?;
        Ok(Self {
            solver_name: Some("Richtmyer Lax-Wendroff".to_string()),
            time_steps: Some(timing.time_steps),
            dt: Some(timing.dt),
            period: timing.is_periodic().then_some(timing.period),
            depth: Some(network.depth()),
            custom: Vec::new(),
        })
    }

    pub fn add_custom(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.push((key.into(), value.into()));
    }
}

// =============================================================================
// Exporter
// =============================================================================

/// CSV implementation of [`ResultSink`]
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// File name of one table, e.g. `p3_run.csv`
    pub fn file_name(quantity: StateQuantity, position: usize, suffix: &str) -> String {
        format!("{}{}_{}.csv", quantity.symbol(), position, suffix)
    }

    fn format_number(&self, value: f64) -> String {
        let formatted = format!("{:.prec$}", value, prec = self.config.precision);
        if self.config.decimal_separator != '.' {
            formatted.replace('.', &self.config.decimal_separator.to_string())
        } else {
            formatted
        }
    }

    fn write_metadata(&self, out: &mut impl Write, artery: &Artery, quantity: StateQuantity) -> Result<(), CsvError> {
        let Some(metadata) = &self.config.metadata else {
            return Ok(());
        };

        writeln!(out, "# Blood Flow Simulation Data")?;
        writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;
        writeln!(out, "# Quantity: {} ({})", quantity, quantity.symbol())?;
        writeln!(out, "# Vessel: {} (level {})", artery.position(), artery.level())?;
        if let Some(solver) = &metadata.solver_name {
            writeln!(out, "# Solver: {}", solver)?;
        }
        if let Some(time_steps) = metadata.time_steps {
            writeln!(out, "# Time Steps: {}", time_steps)?;
        }
        if let Some(dt) = metadata.dt {
            writeln!(out, "# dt: {}", dt)?;
        }
        if let Some(period) = metadata.period {
            writeln!(out, "# Period: {}", period)?;
        }
        if let Some(depth) = metadata.depth {
            writeln!(out, "# Depth: {}", depth)?;
        }
        for (key, value) in &metadata.custom {
            writeln!(out, "# {}: {}", key, value)?;
        }
        writeln!(out, "#")?;
        Ok(())
    }

    fn write_table(
        &self,
        path: &Path,
        artery: &Artery,
        quantity: StateQuantity,
        times: &[f64],
    ) -> Result<(), CsvError> {
        let history = artery
            .history()
            .ok_or(CsvError::MissingHistory(artery.position()))?;
        let table = history.quantity(quantity);
        let delimiter = self.config.delimiter;

        for (record, row) in table.outer_iter().enumerate() {
            if row.iter().any(|value| !value.is_finite()) {
                return Err(CsvError::NonFinite {
                    quantity,
                    vessel: artery.position(),
                    record,
                });
            }
        }

        let mut out = BufWriter::new(File::create(path)?);
        self.write_metadata(&mut out, artery, quantity)?;

        if self.config.include_header {
            write!(out, "t")?;
            for j in 0..history.points() {
                write!(out, "{}x={}", delimiter, self.format_number(artery.grid().position(j)))?;
            }
            writeln!(out)?;
        }

        for (time, row) in times.iter().zip(table.outer_iter()) {
            write!(out, "{}", self.format_number(*time))?;
            for value in row.iter() {
                write!(out, "{}{}", delimiter, self.format_number(*value))?;
            }
            writeln!(out)?;
        }

        out.flush()?;
        Ok(())
    }
}

impl ResultSink for CsvExporter {
    type Error = CsvError;

    fn export_vessel(&self, artery: &Artery, times: &[f64], suffix: &str, directory: &Path) -> Result<Vec<PathBuf>, CsvError> {
        let history = artery
            .history()
            .ok_or(CsvError::MissingHistory(artery.position()))?;
        if times.len() != history.records() {
            return Err(CsvError::LengthMismatch {
                expected: history.records(),
                actual: times.len(),
            });
        }

        [StateQuantity::Area, StateQuantity::Flow, StateQuantity::Pressure]
            .into_iter()
            .map(|quantity| -> Result<PathBuf, CsvError> {
                let path = directory.join(Self::file_name(quantity, artery.position(), suffix));
                self.write_table(&path, artery, quantity, times)?;
                log::debug!("Wrote {}", path.display());
                Ok(path)
            })
            .collect()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArteryParameters, InflowWaveform, NetworkParameters, WallModel};
    use crate::solver::{NullObserver, TimeConfiguration};
    use std::fs;
    use tempfile::TempDir;

    fn network(depth: usize) -> ArteryNetwork {
        let artery = ArteryParameters::new(WallModel::constant(100.0), 20.0, 10.0, 0.1);
        let mut network = ArteryNetwork::new(&NetworkParameters::new(depth, 1.0, 0.9, 0.6, artery)).unwrap();
        network.mesh(5).unwrap();
        network.set_time(TimeConfiguration::fixed(40, 0.05, 3)).unwrap();
        network.initial_conditions(0.0).unwrap();
        network
    }

    fn data_lines(content: &str) -> Vec<&str> {
        content.lines().filter(|line| !line.starts_with('#')).collect()
    }

    // ====== File naming ======

    #[test]
    fn test_file_name() {
        assert_eq!(CsvExporter::file_name(StateQuantity::Area, 0, "run"), "a0_run.csv");
        assert_eq!(CsvExporter::file_name(StateQuantity::Flow, 12, "x"), "q12_x.csv");
        assert_eq!(CsvExporter::file_name(StateQuantity::Pressure, 3, "t"), "p3_t.csv");
    }

    #[test]
    fn test_european_format() {
        let exporter = CsvExporter::new(CsvConfig::european().precision(2));
        assert_eq!(exporter.format_number(3.14159), "3,14");
    }

    // ====== Export ======

    #[test]
    fn test_export_network_writes_three_tables_per_vessel() {
        let mut network = network(2);
        network
            .solve(&InflowWaveform::constant(0.01), 0.0, &mut NullObserver)
            .unwrap();

        let dir = TempDir::new().unwrap();
        let files = CsvExporter::default()
            .export_network(&network, "run", dir.path())
            .unwrap();

        assert_eq!(files.len(), 9);
        for pos in 0..3 {
            for symbol in ["a", "q", "p"] {
                assert!(dir.path().join(format!("{symbol}{pos}_run.csv")).exists());
            }
        }
    }

    #[test]
    fn test_table_shape() {
        let mut network = network(1);
        network.solve(&InflowWaveform::none(), 0.0, &mut NullObserver).unwrap();

        let dir = TempDir::new().unwrap();
        CsvExporter::default()
            .export_network(&network, "shape", dir.path())
            .unwrap();

        let content = fs::read_to_string(dir.path().join("a0_shape.csv")).unwrap();
        let lines = data_lines(&content);

        // Header + 3 snapshots, each with t + 5 nodes
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("t,x=0.000000"));
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), 6);
        }
        assert!(lines[1].starts_with("0.000000,3.141593"));
    }

    #[test]
    fn test_metadata_header() {
        let mut network = network(1);
        network.solve(&InflowWaveform::none(), 0.0, &mut NullObserver).unwrap();

        let mut metadata = CsvMetadata::from_network(&network).unwrap();
        metadata.add_custom("Case", "rest");
        let exporter = CsvExporter::new(CsvConfig::raw().with_metadata(metadata));

        let dir = TempDir::new().unwrap();
        exporter.export_network(&network, "meta", dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("p0_meta.csv")).unwrap();
        assert!(content.starts_with("# Blood Flow Simulation Data"));
        assert!(content.contains("# Quantity: Pressure (p)"));
        assert!(content.contains("# Time Steps: 40"));
        assert!(content.contains("# Case: rest"));
        assert_eq!(data_lines(&content).len(), 3);
    }

    #[test]
    fn test_missing_history() {
        let parameters = ArteryParameters::new(WallModel::constant(100.0), 20.0, 10.0, 0.1);
        let mut artery = Artery::new(0, 0, 1.0, 1.0, &parameters).unwrap();
        artery.mesh(5).unwrap();

        let dir = TempDir::new().unwrap();
        let error = CsvExporter::default()
            .export_vessel(&artery, &[0.0], "x", dir.path())
            .unwrap_err();
        assert!(matches!(error, CsvError::MissingHistory(0)));
    }

    #[test]
    fn test_time_count_mismatch() {
        let network = network(1);
        let dir = TempDir::new().unwrap();

        let error = CsvExporter::default()
            .export_vessel(&network.arteries()[0], &[0.0, 1.0], "x", dir.path())
            .unwrap_err();
        assert!(matches!(error, CsvError::LengthMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let network = network(1);
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does/not/exist");

        let error = CsvExporter::default()
            .export_network(&network, "x", &missing)
            .unwrap_err();
        assert!(matches!(error, CsvError::Io(_)));
    }
}
