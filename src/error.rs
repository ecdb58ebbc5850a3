//! Error taxonomy.
//!
//! Fatal failures abort a whole analysis and come back as [`AnalyzeError`].
//! Everything scoped to one changed symbol is a [`TraceError`]; the analyzer
//! logs it and moves on, so one bad symbol never hides the others' results.

use thiserror::Error;

/// Failures that abort an entire `analyze` call.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The analysis provider, repository or thread pool could not be set up.
    #[error("setup failed: {message}")]
    Setup {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The change set could not be computed or loaded.
    #[error("change detection failed: {message}")]
    ChangeDetection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The caller cancelled the analysis; partial results were discarded.
    #[error("analysis cancelled")]
    Cancelled,

    /// A worker or the collecting task died unexpectedly.
    #[error("analysis worker failed: {0}")]
    Worker(String),
}

impl AnalyzeError {
    pub fn setup(message: impl Into<String>) -> Self {
        AnalyzeError::Setup {
            message: message.into(),
            source: None,
        }
    }

    pub fn setup_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AnalyzeError::Setup {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn change_detection_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AnalyzeError::ChangeDetection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors reported by the static-analysis provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no symbol at {file}:{line}:{column}")]
    NotFound {
        file: String,
        line: u32,
        column: u32,
    },

    #[error("analysis provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider query failed: {0}")]
    Query(String),
}

/// Failures confined to the trace of a single changed symbol.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("symbol kind {0} has no tracing strategy")]
    Unsupported(&'static str),

    #[error("symbol not found at {file}:{line}:{column}")]
    SymbolNotFound {
        file: String,
        line: u32,
        column: u32,
    },

    #[error("{operation} failed: {source}")]
    Provider {
        operation: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("only blank imports can be traced (import {path:?} uses alias {alias:?})")]
    NonBlankImport { alias: String, path: String },

    #[error("import declaration has no imported path")]
    MissingImportInfo,

    #[error("trace cancelled")]
    Cancelled,
}

impl TraceError {
    pub(crate) fn provider(operation: &'static str, source: ProviderError) -> Self {
        match source {
            ProviderError::NotFound { file, line, column } => {
                TraceError::SymbolNotFound { file, line, column }
            }
            other => TraceError::Provider {
                operation,
                source: other,
            },
        }
    }
}

/// Persistent-cache failures. Never escape the cache: a failed read is a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("cache entry could not be decoded: {0}")]
    Decode(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_symbol_not_found() {
        let err = TraceError::provider(
            "resolve symbol",
            ProviderError::NotFound {
                file: "a.go".to_string(),
                line: 3,
                column: 6,
            },
        );
        assert!(matches!(err, TraceError::SymbolNotFound { line: 3, .. }));
    }

    #[test]
    fn test_query_failure_keeps_operation() {
        let err = TraceError::provider("incoming callers", ProviderError::Query("boom".into()));
        assert_eq!(err.to_string(), "incoming callers failed: provider query failed: boom");
    }
}
