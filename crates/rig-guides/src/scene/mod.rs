//! The scene collaborator boundary.
//!
//! The graph never creates geometry itself. Every materialization goes
//! through a [`Scene`], which hands back opaque [`Handle`]s. Writes are
//! issued sequentially, in the order the build pipeline enumerates them.

pub mod memory;

use std::fmt;

pub use memory::MemoryScene;

use crate::error::SceneError;
use crate::model::{Identifier, Transform, Value};

/// Opaque reference to a materialized scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference into an external shape catalog.
///
/// The graph only carries it around; the scene decides what `kind` means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeDescriptor {
    pub kind: String,
    pub label: String,
}

impl ShapeDescriptor {
    /// Catalog kind used for freshly constructed proxies.
    pub const LOCATOR: &'static str = "locator";

    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        ShapeDescriptor {
            kind: kind.into(),
            label: label.into(),
        }
    }

    pub fn locator(label: impl Into<String>) -> Self {
        ShapeDescriptor::new(Self::LOCATOR, label)
    }

    pub fn is_valid(&self) -> bool {
        !self.kind.is_empty() && !self.label.is_empty()
    }
}

/// A user-defined field read back from a live scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveField {
    pub key: String,
    pub value: Value,
    pub locked: bool,
}

/// Capabilities the build pipeline needs from a 3D scene.
pub trait Scene {
    /// Materializes a shape and returns its handle.
    fn create_shape(&mut self, descriptor: &ShapeDescriptor, name: &str)
    -> Result<Handle, SceneError>;

    /// Materializes an empty grouping node.
    fn create_container(&mut self, name: &str) -> Result<Handle, SceneError>;

    /// Moves `child` under `parent`. Returns false if the scene refused the move.
    fn reparent(&mut self, child: Handle, parent: Handle) -> Result<bool, SceneError>;

    fn set_world_transform(&mut self, handle: Handle, transform: &Transform)
    -> Result<(), SceneError>;

    fn get_world_transform(&self, handle: Handle) -> Result<Transform, SceneError>;

    /// Resolves an object by the identifier field written on it at creation.
    fn find_by_identifier(&self, identifier: &Identifier) -> Option<Handle>;

    /// Draws a visual, non-structural connector between two objects.
    fn draw_connector(&mut self, from: Handle, to: Handle) -> Result<Handle, SceneError>;

    /// Writes an arbitrary field on an object.
    fn apply_field(&mut self, handle: Handle, key: &str, value: &Value) -> Result<(), SceneError>;

    /// Returns true if the object exposes a field named `key`.
    fn has_field(&self, handle: Handle, key: &str) -> bool;

    /// Removes an object together with everything parented below it.
    fn delete(&mut self, handle: Handle) -> Result<(), SceneError>;

    /// Reads every user-defined field of an object.
    fn read_fields(&self, handle: Handle) -> Result<Vec<LiveField>, SceneError>;

    /// Helper objects the scene created alongside a shape.
    fn auxiliary_handles(&self, _handle: Handle) -> Vec<Handle> {
        Vec::new()
    }
}
