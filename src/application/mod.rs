// Use cases: per-symbol tracing and whole-change-set analysis.

pub mod analyzer;
pub mod tracer;

pub use analyzer::ImpactAnalyzer;
pub use tracer::{ImpactTracer, TraceContext};
