//! Cross-Service Ambiguity Filter
//!
//! Analysis engines resolve interface dispatch by returning the call sites of
//! every implementation. Followed blindly, a change in one service's private
//! implementation walks up through a shared "run an implementation of X"
//! helper and implicates every other service that also implements X.
//!
//! Three rules prune those edges:
//! - A: a trace that started in private code never ascends into a shared
//!   package.
//! - B: a trace that started in shared code, dipped into a service's private
//!   code and is heading back into shared code stops there.
//! - C: when a method's callers span several packages, callers that share
//!   little of the path walked so far are dropped.

use std::collections::HashSet;

use crate::config::FilterConfig;
use crate::domain::boundary::{common_prefix_len, BoundaryClassifier};
use crate::domain::callpath::CallNode;

/// Which boundary rule rejected a caller edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryRule {
    LeavingPrivateContext,
    SharedRoundTrip,
}

impl BoundaryRule {
    pub fn describe(&self) -> &'static str {
        match self {
            BoundaryRule::LeavingPrivateContext => "private trace reached shared package",
            BoundaryRule::SharedRoundTrip => "shared trace returning through shared package",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AmbiguityFilter {
    classifier: BoundaryClassifier,
    weights: FilterConfig,
}

impl AmbiguityFilter {
    pub fn new(classifier: BoundaryClassifier, weights: &FilterConfig) -> Self {
        Self {
            classifier,
            weights: weights.clone(),
        }
    }

    pub fn classifier(&self) -> &BoundaryClassifier {
        &self.classifier
    }

    /// Rules A and B. `trail` is the path walked so far, current node last.
    pub fn boundary_violation(
        &self,
        caller_pkg: &str,
        started_shared: bool,
        trail: &[CallNode],
    ) -> Option<BoundaryRule> {
        if !self.classifier.is_shared_package(caller_pkg) {
            return None;
        }
        if !started_shared {
            return Some(BoundaryRule::LeavingPrivateContext);
        }
        let visited_private = trail
            .iter()
            .any(|node| self.classifier.is_service_private(&node.package_path));
        if visited_private {
            Some(BoundaryRule::SharedRoundTrip)
        } else {
            None
        }
    }

    /// Rule C. Returns one keep flag per entry of `caller_packages`.
    /// `below` is the path walked before reaching `current`, excluding it.
    ///
    /// Only applies when `current` looks like a dispatched method, its own
    /// package is not shared, and the callers span more than one package.
    pub fn dispatch_survivors(
        &self,
        current: &CallNode,
        current_is_method: bool,
        below: &[CallNode],
        caller_packages: &[&str],
    ) -> Vec<bool> {
        let keep_all = vec![true; caller_packages.len()];
        if !current_is_method || self.classifier.is_shared_package(&current.package_path) {
            return keep_all;
        }
        let distinct: HashSet<&str> = caller_packages.iter().copied().collect();
        if distinct.len() <= 1 {
            return keep_all;
        }

        let scores: Vec<u64> = caller_packages
            .iter()
            .map(|pkg| self.relevance(&current.package_path, below, pkg))
            .collect();
        let max = scores.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return keep_all;
        }

        let threshold = max as f64 * self.weights.retain_ratio;
        scores.iter().map(|&s| s as f64 >= threshold).collect()
    }

    /// Relevance of a caller package to the trace so far.
    pub fn relevance(&self, current_pkg: &str, trail: &[CallNode], caller_pkg: &str) -> u64 {
        let along_path: u64 = trail
            .iter()
            .map(|node| common_prefix_len(&node.package_path, caller_pkg) as u64)
            .sum::<u64>()
            * self.weights.path_prefix_weight;
        let near_current =
            common_prefix_len(current_pkg, caller_pkg) as u64 * self.weights.current_prefix_weight;
        let on_path = if trail.iter().any(|node| node.package_path == caller_pkg) {
            self.weights.same_package_bonus
        } else {
            0
        };
        along_path + near_current + on_path
    }
}

/// True for names qualified by a receiver, e.g. `(*Server).Run` or
/// `Server.Run`.
pub fn looks_like_method(name: &str) -> bool {
    name.starts_with('(') || name.contains('.')
}
