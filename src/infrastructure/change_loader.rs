use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::domain::symbol::ChangedSymbol;
use crate::error::AnalyzeError;

/// Accepts either a bare array or `{"changes": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChangeFile {
    List(Vec<ChangedSymbol>),
    Wrapped { changes: Vec<ChangedSymbol> },
}

pub struct ChangeLoader;

impl ChangeLoader {
    /// Load the changed symbols reported by the change-source collaborator.
    pub fn load(path: &Path) -> Result<Vec<ChangedSymbol>, AnalyzeError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyzeError::change_detection_with(format!("cannot read change set {}", path.display()), e)
        })?;
        let symbols = Self::parse(&content).map_err(|e| {
            AnalyzeError::change_detection_with(format!("invalid change set {}", path.display()), e)
        })?;
        debug!(path = %path.display(), symbols = symbols.len(), "loaded change set");
        Ok(symbols)
    }

    pub fn parse(content: &str) -> serde_json::Result<Vec<ChangedSymbol>> {
        let file: ChangeFile = serde_json::from_str(content)?;
        Ok(match file {
            ChangeFile::List(symbols) => symbols,
            ChangeFile::Wrapped { changes } => changes,
        })
    }
}
