//! Ripples: find the deployable binaries a code change can reach.
//!
//! Given the declarations changed between two revisions, the analyzer walks
//! the caller graph reported by an [`AnalysisProvider`] up to every program
//! entry point, filters out edges that only exist because of interface
//! dispatch across service boundaries, and reports one [`AffectedBinary`]
//! per reachable binary.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::{ImpactAnalyzer, ImpactTracer, TraceContext};
pub use config::Config;
pub use domain::callpath::{AffectedBinary, CallNode, CallPath};
pub use domain::symbol::{ChangedSymbol, Position, SymbolKind};
pub use error::{AnalyzeError, ProviderError, TraceError};
pub use infrastructure::{CancelToken, SnapshotProvider, TraceCache};
pub use ports::{AnalysisProvider, OutputFormat, Reporter};
