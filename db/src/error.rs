//! Error types for schema storage and content binding.
//!
//! [`StoreError`] covers every failure outside the core engine: file I/O,
//! YAML/JSON parsing, schema resolution (wrapped [`SchemaError`]), and
//! content that cannot be bound to the loaded schema.

use std::path::PathBuf;

use lore_schema_core::SchemaError;
use thiserror::Error;

/// Errors that can occur while loading, saving, or binding.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The schema text parsed but failed to resolve.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Content names a type the schema does not define.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Content names a member its owner's definition does not declare.
    #[error("'{owner}' has no member named '{member}'")]
    UnknownMember { owner: String, member: String },

    /// Content is structurally inconsistent with its definition.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// A path was given explicitly but falls under `blocked_paths`.
    #[error("path is blocked by schema settings: {}", .0.display())]
    BlockedPath(PathBuf),

    /// An input path is missing or has an unsupported extension.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
