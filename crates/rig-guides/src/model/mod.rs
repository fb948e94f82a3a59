//! Data model types for guide graphs.
//!
//! This module contains the core entities:
//! - Identifiers (canonical and short forms)
//! - Values and records (free-form attributes, metadata, documents)
//! - Transforms
//! - Proxies, modules and projects

pub mod id;
pub mod module;
pub mod project;
pub mod proxy;
pub mod transform;
pub mod value;

pub use id::{is_canonical, is_short, normalize_canonical, Identifier};
pub use module::{Module, PostBuildHook, GENERIC_MODULE};
pub use project::Project;
pub use proxy::{BuildResult, Proxy, Relationship, DEFAULT_PROXY_NAME};
pub use transform::{Transform, Vec3};
pub use value::{Record, Value, ValueKind};
