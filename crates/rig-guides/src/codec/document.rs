//! Document persistence.
//!
//! A document is a project record stored as JSON. The compressed form is
//! `RIGZ` + uncompressed length (u64, little endian) + zstd frame.
//! Decoding detects which form it was given.

use std::borrow::Cow;
use std::io::Read;

use crate::error::DocumentError;
use crate::limits::{MAGIC_COMPRESSED, MAX_DOCUMENT_SIZE};
use crate::model::{Record, Value};

/// Size of the length prefix following the compressed magic.
const LENGTH_PREFIX: usize = 8;

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a document, plain or compressed.
pub fn decode_document(input: &[u8]) -> Result<Record, DocumentError> {
    if input.is_empty() {
        return Err(DocumentError::Empty);
    }

    let data: Cow<[u8]> = if input.starts_with(MAGIC_COMPRESSED) {
        Cow::Owned(decompress_zstd(&input[MAGIC_COMPRESSED.len()..])?)
    } else {
        if input.len() > MAX_DOCUMENT_SIZE {
            return Err(DocumentError::LengthExceedsLimit {
                field: "document",
                len: input.len(),
                max: MAX_DOCUMENT_SIZE,
            });
        }
        Cow::Borrowed(input)
    };

    match serde_json::from_slice(&data)? {
        Value::Map(record) => Ok(record),
        _ => Err(DocumentError::NotAMap),
    }
}

fn decompress_zstd(compressed: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let Some((prefix, frame)) = compressed.split_first_chunk::<LENGTH_PREFIX>() else {
        return Err(DocumentError::DecompressionFailed(
            "missing uncompressed size".to_string(),
        ));
    };
    let declared_size = u64::from_le_bytes(*prefix);

    if declared_size > MAX_DOCUMENT_SIZE as u64 {
        return Err(DocumentError::LengthExceedsLimit {
            field: "uncompressed_size",
            len: usize::try_from(declared_size).unwrap_or(usize::MAX),
            max: MAX_DOCUMENT_SIZE,
        });
    }
    let declared_size = declared_size as usize;

    let decoder = zstd::Decoder::new(frame)
        .map_err(|e| DocumentError::DecompressionFailed(e.to_string()))?;

    // Never read past the declared size plus one byte, so a lying header
    // cannot make us inflate an unbounded stream.
    let mut decompressed = Vec::with_capacity(declared_size);
    decoder
        .take(declared_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DocumentError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DocumentError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a document as pretty-printed JSON.
pub fn encode_document(record: &Record) -> Result<Vec<u8>, DocumentError> {
    Ok(serde_json::to_vec_pretty(record)?)
}

/// Encodes a document with zstd compression.
pub fn encode_document_compressed(record: &Record, level: i32) -> Result<Vec<u8>, DocumentError> {
    let uncompressed = serde_json::to_vec(record)?;

    let compressed = zstd::encode_all(uncompressed.as_slice(), level)
        .map_err(|e| DocumentError::CompressionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(MAGIC_COMPRESSED.len() + LENGTH_PREFIX + compressed.len());
    out.extend_from_slice(MAGIC_COMPRESSED);
    out.extend_from_slice(&(uncompressed.len() as u64).to_le_bytes());
    out.extend_from_slice(&compressed);

    Ok(out)
}
