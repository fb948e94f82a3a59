//! Record serialization for proxies, modules and projects, and document
//! persistence.
//!
//! Records follow the persisted shape described in [`crate::keys`].
//! Proxy records patch sparsely, module records replace their proxies
//! wholesale and project records rebuild their modules through the
//! project's registry.

mod document;
mod module;
mod proxy;
mod transform;

pub use document::{decode_document, encode_document, encode_document_compressed};
pub use transform::{decode_transform, encode_transform};
