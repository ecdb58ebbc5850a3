// Ports: the analysis-provider contract and the output adapters.

pub mod provider;
pub mod reporter;

pub use provider::{AnalysisProvider, HandleKind, SymbolHandle};
pub use reporter::{OutputFormat, Reporter};
