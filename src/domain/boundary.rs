//! Service Boundary Classification
//!
//! Decides whether a package is shared plumbing (usable by many services) or
//! owned by one service, and names the owning service.
//!
//! The first recognized root segment in a package path wins. A shared root
//! nested under a private root (`internal/billing/api`) therefore belongs to
//! the billing service, not to everyone.

use crate::config::BoundaryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root<'a> {
    Shared,
    Private { service: Option<&'a str> },
}

#[derive(Debug, Clone)]
pub struct BoundaryClassifier {
    module_path: Option<String>,
    shared_roots: Vec<String>,
    private_roots: Vec<String>,
}

impl Default for BoundaryClassifier {
    fn default() -> Self {
        Self::from_config(&BoundaryConfig::default())
    }
}

impl BoundaryClassifier {
    pub fn from_config(config: &BoundaryConfig) -> Self {
        Self {
            module_path: config
                .module_path
                .as_ref()
                .map(|m| m.trim_end_matches('/').to_string())
                .filter(|m| !m.is_empty()),
            shared_roots: config.shared_roots.clone(),
            private_roots: config.private_roots.clone(),
        }
    }

    /// True if the package is shared/common code.
    pub fn is_shared_package(&self, pkg_path: &str) -> bool {
        matches!(self.first_root(pkg_path), Some(Root::Shared))
    }

    /// Segment following the service-private root, or `""` when the package
    /// is shared or unclassifiable.
    pub fn service_identity<'a>(&self, pkg_path: &'a str) -> &'a str {
        match self.first_root(pkg_path) {
            Some(Root::Private { service: Some(service) }) => service,
            _ => "",
        }
    }

    /// True if the package belongs to exactly one service.
    pub fn is_service_private(&self, pkg_path: &str) -> bool {
        !self.service_identity(pkg_path).is_empty()
    }

    /// True only when both packages have an identity and the identities
    /// differ. Shared packages are never "different" from anything.
    pub fn crosses_service(&self, a: &str, b: &str) -> bool {
        let (a, b) = (self.service_identity(a), self.service_identity(b));
        !a.is_empty() && !b.is_empty() && a != b
    }

    fn relative<'a>(&self, pkg_path: &'a str) -> &'a str {
        match &self.module_path {
            Some(module) => pkg_path
                .strip_prefix(module.as_str())
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(pkg_path),
            None => pkg_path,
        }
    }

    fn first_root<'a>(&self, pkg_path: &'a str) -> Option<Root<'a>> {
        let segments: Vec<&'a str> = self
            .relative(pkg_path)
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        for (i, segment) in segments.iter().enumerate() {
            if self.private_roots.iter().any(|r| r == segment) {
                return Some(Root::Private {
                    service: segments.get(i + 1).copied(),
                });
            }
            if self.shared_roots.iter().any(|r| r == segment) {
                return Some(Root::Shared);
            }
        }
        None
    }
}

/// Number of leading `/`-separated segments two package paths share.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.split('/')
        .zip(b.split('/'))
        .take_while(|(x, y)| x == y && !x.is_empty())
        .count()
}
