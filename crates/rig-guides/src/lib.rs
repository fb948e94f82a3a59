//! Identity-linked guide graphs for character rigging.
//!
//! A [`Project`] owns [`Module`]s, a module owns [`Proxy`]s, and proxies
//! reference each other only through [`Identifier`]s. Building a project
//! materializes every proxy through a [`Scene`] and then wires the
//! hierarchy by identity, so a parent may live in any module regardless of
//! declaration order.
//!
//! # Example
//!
//! ```
//! use rig_guides::{MemoryScene, Module, Project, Proxy};
//!
//! let hip = Proxy::new("hip").with_initial_position([0.0, 95.0, 0.0]);
//! let knee = Proxy::new("knee")
//!     .with_parent(&hip)
//!     .with_initial_position([0.0, 50.0, 3.0]);
//!
//! let mut leg = Module::generic("leg");
//! leg.add_proxies([hip, knee]);
//!
//! let mut project = Project::new("hero");
//! project.add_module(leg);
//!
//! let mut scene = MemoryScene::new();
//! let report = project.build_proxy(&mut scene);
//! assert_eq!(report.results.len(), 2);
//! assert_eq!(
//!     scene.parent_of(report.results[1].offset_handle),
//!     Some(report.results[0].handle)
//! );
//!
//! // Projects persist as records
//! let record = project.to_record();
//! let restored = Project::from_record(&record);
//! assert_eq!(restored.to_record(), record);
//! ```

pub mod build;
pub mod codec;
pub mod error;
pub mod keys;
pub mod limits;
pub mod model;
pub mod modules;
pub mod scene;
pub mod validate;

// Re-export commonly used types at crate root
pub use build::{BuildContext, BuildOptions, BuildPhase, BuildReport, SkeletonPass};
pub use codec::{decode_document, encode_document, encode_document_compressed};
pub use error::{DocumentError, SceneError, ValidationError};
pub use model::{
    BuildResult, Identifier, Module, Project, Proxy, Record, Relationship, Transform, Value,
};
pub use modules::ModuleRegistry;
pub use scene::{Handle, MemoryScene, Scene, ShapeDescriptor};
pub use validate::{check_project, validate_project};
