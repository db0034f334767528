use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The selected adapter does not provide an operation the run requires.
    #[error("adapter `{adapter}` does not implement `{capability}`")]
    MissingCapability {
        adapter: String,
        capability: &'static str,
    },

    #[error("unknown document adapter `{0}`")]
    UnknownAdapter(String),

    /// The adapter produced data that breaks its contract (e.g. a page id with no number).
    #[error("adapter contract violation: {0}")]
    AdapterContract(String),

    /// Lookahead ran past the last page without finding where a section ends.
    #[error("section `{heading}` starting on page {page} never terminates")]
    UnterminatedSection { page: f64, heading: String },

    #[error("invalid heading pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
