//! Error types for page migrations.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for migration runs.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Cannot read root directory {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rewrite of {path} introduces syntax errors")]
    SyntaxRegression { path: PathBuf },

    #[error("Rewrite of {path} leaves {} in use without an import", .names.join(", "))]
    UnboundNames { path: PathBuf, names: Vec<String> },

    #[error("Tree-sitter parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
