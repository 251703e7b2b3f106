//! Error types for bag-core

use std::path::PathBuf;

/// Result type for bag-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bag-core operations
///
/// Record lookups never produce these: a missing or broken record degrades
/// to plain node attributes. Errors are reserved for caller misuse and for
/// loading nodes and configuration files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An override was set after attribute resolution had started
    #[error("Cannot override {setting}: attributes already resolved for namespace {namespace}")]
    AlreadyResolved { setting: String, namespace: String },

    /// Node document does not have the expected shape
    #[error("Invalid node at {path}: {message}")]
    InvalidNode { path: PathBuf, message: String },

    /// Resolver configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    // Transparent wrappers for underlying crate errors
    /// Storage error from bag-store
    #[error(transparent)]
    Store(#[from] bag_store::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}
