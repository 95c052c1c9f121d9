//! Error types for storage operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt data under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode collection for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("manifest for {protocol} v{version} is locked")]
    ManifestLocked { protocol: String, version: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
