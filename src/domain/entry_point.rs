//! Entry Point Detection Module
//!
//! Recognizes program entry points (the `main` function of a `main` package)
//! and names the binary each one builds.

use crate::config::BoundaryConfig;
use crate::domain::callpath::CallNode;

/// A detected entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Binary name, taken from the entry package's directory
    pub binary_name: String,
    /// Import path of the entry package
    pub package_path: String,
    /// Name of the entry function
    pub function_name: String,
}

impl EntryPoint {
    pub fn call_node(&self) -> CallNode {
        CallNode::new(self.function_name.clone(), self.package_path.clone())
    }
}

/// Entry point detector
#[derive(Debug, Clone)]
pub struct EntryPointDetector {
    entry_function: String,
    entry_package: String,
}

impl Default for EntryPointDetector {
    fn default() -> Self {
        Self::from_config(&BoundaryConfig::default())
    }
}

impl EntryPointDetector {
    pub fn from_config(config: &BoundaryConfig) -> Self {
        Self {
            entry_function: config.entry_function.clone(),
            entry_package: config.entry_package.clone(),
        }
    }

    /// True for a package that builds a binary.
    pub fn is_entry_package(&self, package_name: &str) -> bool {
        package_name == self.entry_package
    }

    /// True for the entry function of an entry package.
    pub fn is_entry(&self, function_name: &str, package_name: &str) -> bool {
        function_name == self.entry_function && self.is_entry_package(package_name)
    }

    /// Detect the entry point a function represents, if any. An entry with
    /// no package path names no binary and is ignored.
    pub fn detect(
        &self,
        function_name: &str,
        package_name: &str,
        package_path: &str,
    ) -> Option<EntryPoint> {
        if !self.is_entry(function_name, package_name) {
            return None;
        }
        self.entry_for_package(package_path)
    }

    /// Entry point of an entry package, for traversals with no call sites.
    pub fn entry_for_package(&self, package_path: &str) -> Option<EntryPoint> {
        Some(EntryPoint {
            binary_name: binary_name(package_path)?,
            package_path: package_path.to_string(),
            function_name: self.entry_function.clone(),
        })
    }
}

/// Binary name of an entry package: its last path segment.
/// `example.com/svc/cmd/api-server` builds `api-server`.
pub fn binary_name(package_path: &str) -> Option<String> {
    package_path
        .rsplit('/')
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
