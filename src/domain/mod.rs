// Domain model for Ripples: symbols, call paths, boundaries and the pure
// algorithms the tracer builds on.

pub mod ambiguity;
pub mod boundary;
pub mod callpath;
pub mod entry_point;
pub mod import_graph;
pub mod store;
pub mod symbol;
