//! Static-analysis provider port.
//!
//! The provider answers "who calls this", "where is this referenced" and
//! "what imports what" over one read-only analysis snapshot. Tracers share a
//! single provider across threads, so implementations must be `Send + Sync`
//! and must not mutate their snapshot while answering queries.

use serde::{Deserialize, Serialize};

use crate::domain::callpath::CallNode;
use crate::domain::import_graph::ImportGraph;
use crate::domain::symbol::Position;
use crate::error::ProviderError;

/// Declaration kind as the provider reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Function,
    Method,
    Constant,
    Variable,
}

/// A resolved declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolHandle {
    pub name: String,
    pub kind: HandleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub package_path: String,
    /// Declared package name; `main` for entry packages.
    pub package_name: String,
    pub position: Position,
}

impl SymbolHandle {
    /// Stable traversal key: the declaration position.
    pub fn key(&self) -> String {
        self.position.key()
    }

    pub fn call_node(&self) -> CallNode {
        CallNode::new(self.name.clone(), self.package_path.clone())
    }

    /// True if calls to this declaration may go through dynamic dispatch.
    pub fn is_method(&self) -> bool {
        self.kind == HandleKind::Method || self.receiver.is_some()
    }
}

/// Read-only view of the analysis engine.
///
/// Methods take no cancellation token. The tracer checks its token before
/// every call, so cancellation takes effect between calls; an implementation
/// backed by a remote engine that must abort requests already in flight
/// should hold its own clone of the run's `CancelToken`.
pub trait AnalysisProvider: Send + Sync {
    /// Declaration at a position. Fails with `NotFound` if none exists.
    fn resolve_symbol_at(&self, position: &Position) -> Result<SymbolHandle, ProviderError>;

    /// Functions that call `handle`, including every implementation's call
    /// sites when the call goes through an interface.
    fn incoming_callers(&self, handle: &SymbolHandle) -> Result<Vec<SymbolHandle>, ProviderError>;

    /// Locations referencing `handle`.
    fn find_references(&self, handle: &SymbolHandle) -> Result<Vec<Position>, ProviderError>;

    /// Function enclosing a location, or `None` at package level.
    fn containing_function(&self, location: &Position) -> Result<Option<SymbolHandle>, ProviderError>;

    /// Import graph of the whole workspace.
    fn package_import_graph(&self) -> Result<ImportGraph, ProviderError>;
}
