//! JSON file persistence
//!
//! Settings and high scores are small serde documents stored next to the
//! binary (or wherever the caller points them).

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and parse a JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let text = fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Write a JSON document, via a temp file so a crash never leaves half a file
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}
