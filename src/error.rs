//! Error types for the schema compiler

use std::path::PathBuf;
use thiserror::Error;

use crate::graph::SchemaPath;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Fatal compiler errors. Any of these aborts the build before output is produced.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Unresolved reference '{reference}' at {path}")]
    UnresolvedReference { path: SchemaPath, reference: String },

    #[error("Naming collision: '{name}' at {path} is already used by {existing}")]
    NamingCollision {
        name: String,
        path: SchemaPath,
        existing: SchemaPath,
    },

    #[error("Invalid schema at {path}: {reason}")]
    InvalidSchema { path: SchemaPath, reason: String },

    #[error("Unknown target '{name}'{}", suggestion_hint(.suggestion))]
    UnknownTarget {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Output conflict: {} and {} both write to {}", .first.display(), .second.display(), .dir.display())]
    OutputConflict { dir: PathBuf, first: PathBuf, second: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl CompileError {
    /// Schema location of the error, when it originates in the document
    pub fn path(&self) -> Option<&SchemaPath> {
        match self {
            Self::UnresolvedReference { path, .. }
            | Self::NamingCollision { path, .. }
            | Self::InvalidSchema { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn invalid(path: &SchemaPath, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{}'?)", s))
        .unwrap_or_default()
}
