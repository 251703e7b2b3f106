//! Error types for bag-store

use std::path::PathBuf;

/// Result type for bag-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading data bag items
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} item at {path}: {message}")]
    ItemParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported item format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Data bag not found: {bag}")]
    BagNotFound { bag: String },

    #[error("Item {item} not found in data bag {bag}")]
    ItemNotFound { bag: String, item: String },

    #[error("Item {item} in data bag {bag} is malformed: {message}")]
    MalformedItem {
        bag: String,
        item: String,
        message: String,
    },

    #[error("Item {item} in data bag {bag} is encrypted but no secret was provided")]
    MissingSecret { bag: String, item: String },

    #[error("Cipher failure on {field} of item {item}: {message}")]
    Cipher {
        item: String,
        field: String,
        message: String,
    },

    #[error("Record backend unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(bag: &str, item: &str, message: impl Into<String>) -> Self {
        Self::MalformedItem {
            bag: bag.to_string(),
            item: item.to_string(),
            message: message.into(),
        }
    }
}
