//! Output of simulation results
//!
//! The solver only fills per-vessel [`History`](crate::physics::History)
//! buffers. Writing them anywhere is the job of a
//! [`ResultSink`](export::ResultSink):
//!
//! ```text
//! output/
//! ├── mod.rs
//! └── export/
//!     ├── mod.rs   ← ResultSink trait
//!     └── csv.rs   ← a{pos}/q{pos}/p{pos} tables
//! ```

pub mod export;

pub use export::{CsvConfig, CsvError, CsvExporter, CsvMetadata, ResultSink};
