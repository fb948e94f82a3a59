//! Error types for rig-guides.
//!
//! Most of the graph API is tolerant: setters log and keep the old value.
//! These types back the strict `try_*` variants, validation reports,
//! scene calls and document persistence.

use thiserror::Error;

use crate::scene::Handle;

/// A graph entity or setter argument failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name exceeds {max} bytes (got {len})")]
    NameTooLong { len: usize, max: usize },

    #[error("'{value}' is neither a canonical nor a short identifier")]
    InvalidIdentifier { value: String },

    #[error("proxy {identifier} cannot be its own parent")]
    SelfParent { identifier: String },

    #[error("{field} contains a non-finite component")]
    NonFinite { field: &'static str },

    #[error("locator scale must be positive and finite (got {value})")]
    InvalidLocatorScale { value: f64 },

    #[error("shape descriptor must have a kind and a label")]
    InvalidShape,

    #[error("proxy '{name}' has no shape descriptor")]
    MissingShape { name: String },

    #[error("color needs exactly 3 components (got {count})")]
    ColorComponents { count: usize },

    #[error("value for '{key}' is invalid: {reason}")]
    InvalidValue { key: String, reason: &'static str },

    #[error("module '{name}' owns no proxies")]
    EmptyModule { name: String },

    #[error("project '{name}' owns no modules")]
    EmptyProject { name: String },

    #[error("unknown module type '{type_name}'")]
    UnknownModuleType { type_name: String },

    #[error("identifier {identifier} is used by more than one proxy")]
    DuplicateIdentifier { identifier: String },

    #[error("parent chain of {identifier} forms a cycle")]
    ParentCycle { identifier: String },
}

/// A call into the scene collaborator failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("no scene object for handle {0}")]
    UnknownHandle(Handle),

    #[error("scene rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    #[error("field '{key}' is locked on {handle}")]
    LockedField { handle: Handle, key: String },
}

/// Loading or saving a persisted document failed.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,

    #[error("document root must be a map")]
    NotAMap,

    #[error("{field} length {len} exceeds limit {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("declared size {declared} does not match decompressed size {actual}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
