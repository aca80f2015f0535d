use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by a search backend (tantivy, usearch).
    #[error("Index backend error: {0}")]
    Index(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Persisted state exists but does not agree with itself.
    #[error("Incompatible persisted state: {0}")]
    Incompatible(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn index(err: impl std::fmt::Display) -> Self {
        Self::Index(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
