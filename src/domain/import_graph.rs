//! Package Import Graph
//!
//! Whole-workspace `package -> imported packages` relation. Package
//! initializers have no call sites, so their reach is the set of entry
//! packages that import them, directly or transitively.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::entry_point::{EntryPoint, EntryPointDetector};

/// A package and the packages it imports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
    /// Declared package name; entry packages are named `main`
    pub name: String,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportGraph {
    packages: BTreeMap<String, PackageNode>,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_package(&mut self, path: impl Into<String>, name: impl Into<String>, imports: Vec<String>) {
        self.packages.insert(
            path.into(),
            PackageNode {
                name: name.into(),
                imports,
            },
        );
    }

    pub fn package(&self, path: &str) -> Option<&PackageNode> {
        self.packages.get(path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Entry packages in path order.
    pub fn entry_points(&self, detector: &EntryPointDetector) -> Vec<EntryPoint> {
        self.packages
            .iter()
            .filter(|(_, node)| detector.is_entry_package(&node.name))
            .filter_map(|(path, _)| detector.entry_for_package(path))
            .collect()
    }

    /// True if `from` is `target` or imports it transitively.
    /// Import cycles are tolerated.
    pub fn reaches(&self, from: &str, target: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut pending = vec![from];
        while let Some(package) = pending.pop() {
            if package == target {
                return true;
            }
            if !visited.insert(package) {
                continue;
            }
            if let Some(node) = self.packages.get(package) {
                pending.extend(node.imports.iter().map(String::as_str));
            }
        }
        false
    }

    /// Entry points whose package reaches `target`.
    pub fn entry_points_reaching(&self, target: &str, detector: &EntryPointDetector) -> Vec<EntryPoint> {
        self.entry_points(detector)
            .into_iter()
            .filter(|entry| self.reaches(&entry.package_path, target))
            .collect()
    }
}
