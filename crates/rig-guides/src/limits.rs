//! Limits and format constants for rig-guides documents.
//!
//! These limits protect against resource exhaustion when loading
//! documents from untrusted files.

/// Maximum size of a decoded document (64 MB).
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

/// Maximum length for proxy, module and project names.
pub const MAX_NAME_LEN: usize = 256;

/// Magic bytes for zstd-compressed documents.
pub const MAGIC_COMPRESSED: &[u8; 4] = b"RIGZ";

/// Length of generated short identifiers when no length is requested.
pub const DEFAULT_SHORT_ID_LENGTH: usize = 8;

/// Number of hex digits in a canonical identifier.
pub const CANONICAL_HEX_DIGITS: usize = 32;

/// Default zstd level used by the CLI.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;
