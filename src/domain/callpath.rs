// Call path structures for Ripples.
// Represents discovered routes from an entry point down to a changed symbol.

use serde::{Deserialize, Serialize};

/// One hop in a discovered path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallNode {
    pub function_name: String,
    pub package_path: String,
}

impl CallNode {
    pub fn new(function_name: impl Into<String>, package_path: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            package_path: package_path.into(),
        }
    }

    /// `package.Function`, or just `Function` when the package is unknown.
    pub fn qualified_name(&self) -> String {
        if self.package_path.is_empty() {
            self.function_name.clone()
        } else {
            format!("{}.{}", self.package_path, self.function_name)
        }
    }
}

/// A route from an entry point to the changed symbol.
///
/// `path[0]` is always the entry point and the last node is where the trace
/// started. The traversal that built it never visited a declaration twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPath {
    pub binary_name: String,
    pub entry_package_path: String,
    pub path: Vec<CallNode>,
}

impl CallPath {
    pub fn new(
        binary_name: impl Into<String>,
        entry_package_path: impl Into<String>,
        path: Vec<CallNode>,
    ) -> Self {
        Self {
            binary_name: binary_name.into(),
            entry_package_path: entry_package_path.into(),
            path,
        }
    }

    /// Render the path with the entry point marked `(main)` and the changed
    /// symbol marked `(Changed)`.
    pub fn formatted_trace(&self) -> Vec<String> {
        let last = self.path.len().saturating_sub(1);
        self.path
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let name = node.qualified_name();
                if i == 0 {
                    format!("{} (main)", name)
                } else if i == last {
                    format!("{} (Changed)", name)
                } else {
                    name
                }
            })
            .collect()
    }
}

/// Externally visible result: one deployable binary touched by the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedBinary {
    pub name: String,
    pub package_path: String,
    pub trace_path: Vec<String>,
}

impl AffectedBinary {
    /// True if `self` should be reported instead of `other` for the same
    /// binary: shorter trace wins, ties go to the lexicographically smaller.
    pub fn preferred_over(&self, other: &AffectedBinary) -> bool {
        (self.trace_path.len(), &self.trace_path) < (other.trace_path.len(), &other.trace_path)
    }
}

impl From<&CallPath> for AffectedBinary {
    fn from(path: &CallPath) -> Self {
        Self {
            name: path.binary_name.clone(),
            package_path: path.entry_package_path.clone(),
            trace_path: path.formatted_trace(),
        }
    }
}
