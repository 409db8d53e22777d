//! Error types for the key-value store.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store file {0} does not hold a JSON object")]
    NotAnObject(PathBuf),

    #[error("no config directory; pass an explicit store path")]
    NoConfigDir,
}
