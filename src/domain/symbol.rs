//! Changed-symbol model.
//!
//! A [`ChangedSymbol`] is one declaration touched between two revisions, as
//! reported by the change-source collaborator. Its [`SymbolKind`] selects the
//! traversal strategy used to find the binaries it can reach.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A source position (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Stable identity of a declaration: `file:line:column`.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Kind of a changed declaration, with the extra data each kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolKind {
    /// A free function. `receiver` is set when the collaborator could not
    /// tell methods apart and reports them as functions.
    Function {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
    },
    /// A method bound to a receiver type.
    Method { receiver: String },
    Constant,
    Variable,
    /// A package initializer; runs whenever its package is imported.
    Init,
    /// An import declaration. Only anonymous (`_`) imports are traceable.
    BlankImport { alias: String, path: String },
    /// Type declarations carry no call sites and are skipped.
    Type,
    Struct,
    Interface,
}

impl SymbolKind {
    pub fn label(&self) -> &'static str {
        match self {
            SymbolKind::Function { .. } => "function",
            SymbolKind::Method { .. } => "method",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Init => "init",
            SymbolKind::BlankImport { .. } => "import",
            SymbolKind::Type => "type",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
        }
    }

    /// True if some tracing strategy exists for this kind.
    pub fn is_traceable(&self) -> bool {
        !matches!(
            self,
            SymbolKind::Type | SymbolKind::Struct | SymbolKind::Interface
        )
    }

    /// Receiver type, for functions and methods bound to one.
    pub fn receiver(&self) -> Option<&str> {
        match self {
            SymbolKind::Function { receiver } => receiver.as_deref(),
            SymbolKind::Method { receiver } => Some(receiver.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One changed declaration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedSymbol {
    pub name: String,
    #[serde(flatten)]
    pub kind: SymbolKind,
    pub position: Position,
    pub package_path: String,
}

impl ChangedSymbol {
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        position: Position,
        package_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            package_path: package_path.into(),
        }
    }

    pub fn function(name: &str, package_path: &str, position: Position) -> Self {
        Self::new(name, SymbolKind::Function { receiver: None }, position, package_path)
    }

    pub fn method(name: &str, receiver: &str, package_path: &str, position: Position) -> Self {
        Self::new(
            name,
            SymbolKind::Method {
                receiver: receiver.to_string(),
            },
            position,
            package_path,
        )
    }

    pub fn constant(name: &str, package_path: &str, position: Position) -> Self {
        Self::new(name, SymbolKind::Constant, position, package_path)
    }

    pub fn init(package_path: &str, position: Position) -> Self {
        Self::new("init", SymbolKind::Init, position, package_path)
    }

    pub fn blank_import(alias: &str, path: &str, package_path: &str, position: Position) -> Self {
        Self::new(
            path,
            SymbolKind::BlankImport {
                alias: alias.to_string(),
                path: path.to_string(),
            },
            position,
            package_path,
        )
    }
}

impl fmt::Display for ChangedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.receiver() {
            Some(receiver) => write!(
                f,
                "{} {}.({}).{} ({})",
                self.kind, self.package_path, receiver, self.name, self.position
            ),
            None => write!(
                f,
                "{} {}.{} ({})",
                self.kind, self.package_path, self.name, self.position
            ),
        }
    }
}
