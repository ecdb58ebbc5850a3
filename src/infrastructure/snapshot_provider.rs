/// Snapshot Provider
///
/// A read-only `AnalysisProvider` over a serialized analysis snapshot:
/// declarations, call edges, reference sites and packages, as an analysis
/// engine exported them. Dispatch edges are kept exactly as the engine
/// over-approximates them (every implementation's call sites).
///
/// Declarations are addressed by their position key `file:line:column`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::import_graph::ImportGraph;
use crate::domain::symbol::Position;
use crate::error::{AnalyzeError, ProviderError};
use crate::ports::provider::{AnalysisProvider, HandleKind, SymbolHandle};

/// `caller` calls `callee`; both are declaration keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
}

/// One use of `symbol` at `location`, inside `containing` (a function key)
/// or at package level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSite {
    pub symbol: String,
    pub location: Position,
    #[serde(default)]
    pub containing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub declarations: Vec<SymbolHandle>,
    pub calls: Vec<CallEdge>,
    pub references: Vec<ReferenceSite>,
    pub packages: Vec<PackageEntry>,
}

impl Snapshot {
    pub fn declare(mut self, handle: SymbolHandle) -> Self {
        self.declarations.push(handle);
        self
    }

    pub fn function(self, name: &str, package_path: &str, package_name: &str, position: Position) -> Self {
        self.declare(SymbolHandle {
            name: name.to_string(),
            kind: HandleKind::Function,
            receiver: None,
            package_path: package_path.to_string(),
            package_name: package_name.to_string(),
            position,
        })
    }

    pub fn method(
        self,
        name: &str,
        receiver: &str,
        package_path: &str,
        package_name: &str,
        position: Position,
    ) -> Self {
        self.declare(SymbolHandle {
            name: name.to_string(),
            kind: HandleKind::Method,
            receiver: Some(receiver.to_string()),
            package_path: package_path.to_string(),
            package_name: package_name.to_string(),
            position,
        })
    }

    pub fn constant(self, name: &str, package_path: &str, package_name: &str, position: Position) -> Self {
        self.declare(SymbolHandle {
            name: name.to_string(),
            kind: HandleKind::Constant,
            receiver: None,
            package_path: package_path.to_string(),
            package_name: package_name.to_string(),
            position,
        })
    }

    pub fn variable(self, name: &str, package_path: &str, package_name: &str, position: Position) -> Self {
        self.declare(SymbolHandle {
            name: name.to_string(),
            kind: HandleKind::Variable,
            receiver: None,
            package_path: package_path.to_string(),
            package_name: package_name.to_string(),
            position,
        })
    }

    pub fn call(mut self, caller: &str, callee: &str) -> Self {
        self.calls.push(CallEdge {
            caller: caller.to_string(),
            callee: callee.to_string(),
        });
        self
    }

    pub fn reference(mut self, symbol: &str, location: Position, containing: Option<&str>) -> Self {
        self.references.push(ReferenceSite {
            symbol: symbol.to_string(),
            location,
            containing: containing.map(str::to_string),
        });
        self
    }

    pub fn package(mut self, path: &str, name: &str, imports: &[&str]) -> Self {
        self.packages.push(PackageEntry {
            path: path.to_string(),
            name: name.to_string(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}

pub struct SnapshotProvider {
    by_key: HashMap<String, SymbolHandle>,
    // (file, line) -> declaration keys
    by_line: HashMap<(String, u32), Vec<String>>,
    callers: HashMap<String, Vec<String>>,
    references: HashMap<String, Vec<Position>>,
    containing: HashMap<String, Option<String>>,
    import_graph: ImportGraph,
}

impl SnapshotProvider {
    pub fn new(snapshot: Snapshot) -> Self {
        let mut by_key = HashMap::new();
        let mut by_line: HashMap<(String, u32), Vec<String>> = HashMap::new();
        for handle in snapshot.declarations {
            let key = handle.key();
            by_line
                .entry((handle.position.file.clone(), handle.position.line))
                .or_default()
                .push(key.clone());
            by_key.insert(key, handle);
        }

        let mut callers: HashMap<String, Vec<String>> = HashMap::new();
        for edge in snapshot.calls {
            let entry = callers.entry(edge.callee).or_default();
            if !entry.contains(&edge.caller) {
                entry.push(edge.caller);
            }
        }

        let mut references: HashMap<String, Vec<Position>> = HashMap::new();
        let mut containing = HashMap::new();
        for site in snapshot.references {
            containing.insert(site.location.key(), site.containing);
            references.entry(site.symbol).or_default().push(site.location);
        }

        let mut import_graph = ImportGraph::new();
        for package in snapshot.packages {
            import_graph.add_package(package.path, package.name, package.imports);
        }

        Self {
            by_key,
            by_line,
            callers,
            references,
            containing,
            import_graph,
        }
    }

    /// Load a JSON snapshot. Failing to read or parse it is a setup failure.
    pub fn from_file(path: &Path) -> Result<Self, AnalyzeError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyzeError::setup_with(format!("cannot read snapshot {}", path.display()), e)
        })?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            AnalyzeError::setup_with(format!("invalid snapshot {}", path.display()), e)
        })?;
        Ok(Self::new(snapshot))
    }

    pub fn declaration_count(&self) -> usize {
        self.by_key.len()
    }

    fn handle(&self, key: &str) -> Result<SymbolHandle, ProviderError> {
        self.by_key
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::Query(format!("dangling declaration key {}", key)))
    }
}

impl AnalysisProvider for SnapshotProvider {
    fn resolve_symbol_at(&self, position: &Position) -> Result<SymbolHandle, ProviderError> {
        if let Some(handle) = self.by_key.get(&position.key()) {
            return Ok(handle.clone());
        }
        // Column drift: accept the only declaration on that line.
        if let Some(keys) = self.by_line.get(&(position.file.clone(), position.line)) {
            if let [key] = keys.as_slice() {
                return self.handle(key);
            }
        }
        Err(ProviderError::NotFound {
            file: position.file.clone(),
            line: position.line,
            column: position.column,
        })
    }

    fn incoming_callers(&self, handle: &SymbolHandle) -> Result<Vec<SymbolHandle>, ProviderError> {
        match self.callers.get(&handle.key()) {
            Some(keys) => keys.iter().map(|key| self.handle(key)).collect(),
            None => Ok(Vec::new()),
        }
    }

    fn find_references(&self, handle: &SymbolHandle) -> Result<Vec<Position>, ProviderError> {
        Ok(self.references.get(&handle.key()).cloned().unwrap_or_default())
    }

    fn containing_function(&self, location: &Position) -> Result<Option<SymbolHandle>, ProviderError> {
        match self.containing.get(&location.key()) {
            Some(Some(key)) => self.handle(key).map(Some),
            _ => Ok(None),
        }
    }

    fn package_import_graph(&self) -> Result<ImportGraph, ProviderError> {
        Ok(self.import_graph.clone())
    }
}
