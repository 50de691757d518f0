//! Boundary errors the host needs to know about. Parser-level failures
//! stay soft (a filter becomes `FilterCategory::NotImplemented`, never
//! an `Err`) per spec.md §7; this enum only covers I/O and config shape
//! problems.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FilterCoreError {
    #[error("failed to read subscription file {path}: {source}")]
    SubscriptionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to access config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read resource file {path}: {source}")]
    ResourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FilterCoreError>;
