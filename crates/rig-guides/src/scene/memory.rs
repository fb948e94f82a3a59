//! In-process scene used by tests and the command-line tool.
//!
//! Objects live in a flat arena indexed by [`Handle`]; deleted objects
//! leave an empty slot so handles stay stable. Only the pieces of
//! scene behavior the build pipeline observes are modeled: naming,
//! parenting, transforms, fields (optionally locked), connectors and
//! auxiliary annotation objects.

use std::collections::{HashMap, HashSet};

use crate::error::SceneError;
use crate::keys;
use crate::model::{Identifier, Record, Transform, Value};
use crate::scene::{Handle, LiveField, Scene, ShapeDescriptor};

/// Shape kinds that expose a `locatorScale` knob.
const SCALABLE_KINDS: [&str; 2] = [ShapeDescriptor::LOCATOR, "pole"];

/// Shape kinds that come with an auxiliary annotation object.
const ANNOTATED_KINDS: [&str; 1] = ["pole"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Shape(String),
    Container,
    Connector { from: Handle, to: Handle },
    Annotation,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<Handle>,
    pub transform: Transform,
    pub fields: Record,
    locked: HashSet<String>,
    auxiliary: Vec<Handle>,
}

impl SceneNode {
    fn new(name: &str, kind: NodeKind) -> Self {
        SceneNode {
            name: name.to_string(),
            kind,
            parent: None,
            transform: Transform::IDENTITY,
            fields: Record::new(),
            locked: HashSet::new(),
            auxiliary: Vec::new(),
        }
    }
}

/// A scene held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: Vec<Option<SceneNode>>,
    failing_names: HashSet<String>,
    failing_operations: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_shape` fail for objects named `name`.
    pub fn fail_shape(&mut self, name: impl Into<String>) {
        self.failing_names.insert(name.into());
    }

    /// Makes every call of `operation` fail.
    pub fn fail_operation(&mut self, operation: &'static str) {
        self.failing_operations.insert(operation);
    }

    pub fn node(&self, handle: Handle) -> Option<&SceneNode> {
        self.nodes.get(handle.0 as usize).and_then(Option::as_ref)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent_of(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).and_then(|n| n.parent)
    }

    pub fn name_of(&self, handle: Handle) -> Option<&str> {
        self.node(handle).map(|n| n.name.as_str())
    }

    pub fn field(&self, handle: Handle, key: &str) -> Option<&Value> {
        self.node(handle).and_then(|n| n.fields.get(key))
    }

    /// Finds the first object with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<Handle> {
        self.handles().find(|h| self.name_of(*h) == Some(name))
    }

    /// Returns the children of `handle` in creation order.
    pub fn children_of(&self, handle: Handle) -> Vec<Handle> {
        self.handles()
            .filter(|h| self.parent_of(*h) == Some(handle))
            .collect()
    }

    /// Returns every connector as `(from, to)`.
    pub fn connectors(&self) -> Vec<(Handle, Handle)> {
        self.nodes
            .iter()
            .flatten()
            .filter_map(|n| match n.kind {
                NodeKind::Connector { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Number of times `operation` was called, failed calls included.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.get(operation).copied().unwrap_or(0)
    }

    /// Simulates an artist editing a field in the scene.
    pub fn set_field(&mut self, handle: Handle, key: &str, value: Value) -> Result<(), SceneError> {
        let node = self.node_mut(handle)?;
        node.fields.insert(key.to_string(), value);
        Ok(())
    }

    /// Simulates an artist moving an object in the scene.
    pub fn move_object(&mut self, handle: Handle, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(handle)?.transform = transform;
        Ok(())
    }

    /// Locks a field so that writes to it fail and refresh skips it.
    pub fn lock_field(&mut self, handle: Handle, key: &str) -> Result<(), SceneError> {
        self.node_mut(handle)?.locked.insert(key.to_string());
        Ok(())
    }

    /// Renders the hierarchy below the root objects as an indented tree.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for root in self.handles().filter(|h| self.parent_of(*h).is_none()) {
            self.outline_into(root, 0, &mut out);
        }
        out
    }

    fn outline_into(&self, handle: Handle, depth: usize, out: &mut String) {
        let Some(node) = self.node(handle) else {
            return;
        };
        let kind = match &node.kind {
            NodeKind::Shape(kind) => kind.as_str(),
            NodeKind::Container => "group",
            NodeKind::Connector { .. } => "connector",
            NodeKind::Annotation => "annotation",
        };
        out.push_str(&format!("{}{} [{}]\n", "  ".repeat(depth), node.name, kind));
        for child in self.children_of(handle) {
            self.outline_into(child, depth + 1, out);
        }
    }

    fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        (0..self.nodes.len())
            .map(|i| Handle(i as u64))
            .filter(|h| self.node(*h).is_some())
    }

    fn record_call(&mut self, operation: &'static str) -> Result<(), SceneError> {
        *self.calls.entry(operation).or_insert(0) += 1;
        if self.failing_operations.contains(operation) {
            return Err(SceneError::Rejected {
                operation,
                reason: "operation disabled".to_string(),
            });
        }
        Ok(())
    }

    fn node_mut(&mut self, handle: Handle) -> Result<&mut SceneNode, SceneError> {
        self.nodes
            .get_mut(handle.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownHandle(handle))
    }

    fn push(&mut self, node: SceneNode) -> Handle {
        self.nodes.push(Some(node));
        Handle(self.nodes.len() as u64 - 1)
    }

    fn clear_slot(&mut self, handle: Handle) {
        if let Some(slot) = self.nodes.get_mut(handle.0 as usize) {
            *slot = None;
        }
    }

    fn is_ancestor(&self, candidate: Handle, of: Handle) -> bool {
        let mut current = Some(of);
        while let Some(h) = current {
            if h == candidate {
                return true;
            }
            current = self.parent_of(h);
        }
        false
    }
}

impl Scene for MemoryScene {
    fn create_shape(
        &mut self,
        descriptor: &ShapeDescriptor,
        name: &str,
    ) -> Result<Handle, SceneError> {
        self.record_call("create_shape")?;
        if self.failing_names.contains(name) {
            return Err(SceneError::Rejected {
                operation: "create_shape",
                reason: format!("cannot create '{}'", name),
            });
        }

        let mut node = SceneNode::new(name, NodeKind::Shape(descriptor.kind.clone()));
        if SCALABLE_KINDS.contains(&descriptor.kind.as_str()) {
            node.fields
                .insert(keys::LOCATOR_SCALE.to_string(), Value::Float(1.0));
        }
        let handle = self.push(node);

        if ANNOTATED_KINDS.contains(&descriptor.kind.as_str()) {
            let mut annotation = SceneNode::new(&format!("{}_annotation", name), NodeKind::Annotation);
            annotation.parent = Some(handle);
            let aux = self.push(annotation);
            self.node_mut(handle)?.auxiliary.push(aux);
        }

        Ok(handle)
    }

    fn create_container(&mut self, name: &str) -> Result<Handle, SceneError> {
        self.record_call("create_container")?;
        Ok(self.push(SceneNode::new(name, NodeKind::Container)))
    }

    fn reparent(&mut self, child: Handle, parent: Handle) -> Result<bool, SceneError> {
        self.record_call("reparent")?;
        self.node_mut(parent)?;
        if self.is_ancestor(child, parent) {
            return Ok(false);
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(true)
    }

    fn set_world_transform(
        &mut self,
        handle: Handle,
        transform: &Transform,
    ) -> Result<(), SceneError> {
        self.record_call("set_world_transform")?;
        self.node_mut(handle)?.transform = *transform;
        Ok(())
    }

    fn get_world_transform(&self, handle: Handle) -> Result<Transform, SceneError> {
        self.node(handle)
            .map(|n| n.transform)
            .ok_or(SceneError::UnknownHandle(handle))
    }

    fn find_by_identifier(&self, identifier: &Identifier) -> Option<Handle> {
        self.handles().find(|h| {
            self.field(*h, keys::UUID)
                .and_then(Value::as_str)
                .and_then(|s| Identifier::parse(s).ok())
                .is_some_and(|id| &id == identifier)
        })
    }

    fn draw_connector(&mut self, from: Handle, to: Handle) -> Result<Handle, SceneError> {
        self.record_call("draw_connector")?;
        let from_name = self.node(from).ok_or(SceneError::UnknownHandle(from))?.name.clone();
        let to_name = self.node(to).ok_or(SceneError::UnknownHandle(to))?.name.clone();
        let name = format!("{}_to_{}_connector", from_name, to_name);
        Ok(self.push(SceneNode::new(&name, NodeKind::Connector { from, to })))
    }

    fn apply_field(&mut self, handle: Handle, key: &str, value: &Value) -> Result<(), SceneError> {
        self.record_call("apply_field")?;
        let node = self.node_mut(handle)?;
        if node.locked.contains(key) {
            return Err(SceneError::LockedField {
                handle,
                key: key.to_string(),
            });
        }
        node.fields.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn has_field(&self, handle: Handle, key: &str) -> bool {
        self.field(handle, key).is_some()
    }

    fn read_fields(&self, handle: Handle) -> Result<Vec<LiveField>, SceneError> {
        if self.failing_operations.contains("read_fields") {
            return Err(SceneError::Rejected {
                operation: "read_fields",
                reason: "operation disabled".to_string(),
            });
        }
        let node = self.node(handle).ok_or(SceneError::UnknownHandle(handle))?;
        Ok(node
            .fields
            .iter()
            .map(|(key, value)| LiveField {
                key: key.clone(),
                value: value.clone(),
                locked: node.locked.contains(key),
            })
            .collect())
    }

    fn delete(&mut self, handle: Handle) -> Result<(), SceneError> {
        self.record_call("delete")?;
        self.node_mut(handle)?;

        let mut doomed = vec![handle];
        let mut next = 0;
        while next < doomed.len() {
            let children = self.children_of(doomed[next]);
            doomed.extend(children);
            next += 1;
        }
        for handle in &doomed {
            self.clear_slot(*handle);
        }

        // Connectors do not outlive either end
        let dangling: Vec<Handle> = self
            .handles()
            .filter(|h| {
                matches!(
                    self.node(*h).map(|n| &n.kind),
                    Some(NodeKind::Connector { from, to })
                        if doomed.contains(from) || doomed.contains(to)
                )
            })
            .collect();
        for handle in dangling {
            self.clear_slot(handle);
        }
        Ok(())
    }

    fn auxiliary_handles(&self, handle: Handle) -> Vec<Handle> {
        self.node(handle)
            .map(|n| n.auxiliary.clone())
            .unwrap_or_default()
    }
}
