//! Identifiers for proxies and other graph nodes.
//!
//! Identifiers are the only legitimate way to reference another node in
//! the graph. Two syntactic forms are accepted:
//! - canonical: 32 hex digits, optionally hyphenated `8-4-4-4-12`
//! - short: lowercase alphanumeric, usually of a fixed length
//!
//! Validation is purely syntactic. Nothing enforces uniqueness; collisions
//! are reported by [`crate::validate`] but never prevented.

use std::fmt;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::limits::{CANONICAL_HEX_DIGITS, DEFAULT_SHORT_ID_LENGTH};

/// Group lengths of a hyphenated canonical identifier.
const CANONICAL_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

const SHORT_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// An opaque, syntactically validated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Generates a fresh canonical identifier (hyphenated UUIDv4).
    pub fn generate() -> Self {
        Identifier(Uuid::new_v4().hyphenated().to_string())
    }

    /// Generates a fresh short identifier of `len` characters.
    ///
    /// A zero length falls back to [`DEFAULT_SHORT_ID_LENGTH`].
    pub fn generate_short(len: usize) -> Self {
        let len = if len == 0 { DEFAULT_SHORT_ID_LENGTH } else { len };
        let mut s = String::with_capacity(len);
        while s.len() < len {
            for byte in Uuid::new_v4().as_bytes() {
                if s.len() == len {
                    break;
                }
                s.push(SHORT_ALPHABET[(*byte as usize) % SHORT_ALPHABET.len()] as char);
            }
        }
        Identifier(s)
    }

    /// Derives a canonical identifier from input bytes using SHA-256.
    ///
    /// ```text
    /// hash = SHA-256(input_bytes)[0:16]
    /// hash[6] = (hash[6] & 0x0F) | 0x80  // version 8
    /// hash[8] = (hash[8] & 0x3F) | 0x80  // RFC 4122 variant
    /// ```
    pub fn derived(input: &[u8]) -> Self {
        let hash = Sha256::digest(input);
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);

        bytes[6] = (bytes[6] & 0x0F) | 0x80;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;

        Identifier(Uuid::from_bytes(bytes).hyphenated().to_string())
    }

    /// Parses an identifier in either canonical or short form.
    ///
    /// Canonical identifiers are stored lowercase and hyphenated, so every
    /// spelling of the same identity compares equal.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if let Some(hex) = normalize_canonical(s) {
            Ok(Identifier(hyphenate(&hex)))
        } else if is_short(s, None) {
            Ok(Identifier(s.to_string()))
        } else {
            Err(ValidationError::InvalidIdentifier {
                value: s.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this identifier is in canonical form.
    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Identifier {
    type Error = ValidationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Identifier::parse(s)
    }
}

/// Returns true if `s` matches `hex{8}-?hex{4}-?hex{4}-?hex{4}-?hex{12}`.
pub fn is_canonical(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut pos = 0;
    for (i, group) in CANONICAL_GROUPS.iter().enumerate() {
        if i > 0 && bytes.get(pos) == Some(&b'-') {
            pos += 1;
        }
        let end = pos + group;
        if end > bytes.len() || !bytes[pos..end].iter().all(u8::is_ascii_hexdigit) {
            return false;
        }
        pos = end;
    }
    pos == bytes.len()
}

/// Returns true if `s` matches `[a-z0-9]{len}`, or `[a-z0-9]+` when no
/// length is given.
pub fn is_short(s: &str, len: Option<usize>) -> bool {
    if s.is_empty() {
        return false;
    }
    if let Some(len) = len {
        if s.len() != len {
            return false;
        }
    }
    s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Strips hyphens from a canonical identifier and lowercases it.
///
/// Returns `None` if `s` is not canonical.
pub fn normalize_canonical(s: &str) -> Option<String> {
    if !is_canonical(s) {
        return None;
    }
    let hex: String = s
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    debug_assert_eq!(hex.len(), CANONICAL_HEX_DIGITS);
    Some(hex)
}

/// Inserts hyphens between the groups of 32 normalized hex digits.
fn hyphenate(hex: &str) -> String {
    let mut out = String::with_capacity(CANONICAL_HEX_DIGITS + CANONICAL_GROUPS.len() - 1);
    let mut pos = 0;
    for (i, group) in CANONICAL_GROUPS.iter().enumerate() {
        if i > 0 {
            out.push('-');
        }
        out.push_str(&hex[pos..pos + group]);
        pos += group;
    }
    out
}
