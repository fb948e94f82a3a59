//! Proxies: the placeholder nodes an artist poses before a rig is built.
//!
//! Every setter comes in two flavors. `try_*` returns a
//! [`ValidationError`]; the plain setter logs the rejection and leaves the
//! proxy unchanged, so authoring scripts keep running past a bad value.

use tracing::{debug, warn};

use crate::error::{SceneError, ValidationError};
use crate::keys;
use crate::limits::MAX_NAME_LEN;
use crate::model::transform::{self, Transform, Vec3};
use crate::model::{Identifier, Record, Value};
use crate::scene::{Handle, Scene, ShapeDescriptor};

/// Default name of a freshly constructed proxy.
pub const DEFAULT_PROXY_NAME: &str = "proxy";

/// How a proxy points at another proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// A real parent edge in the built hierarchy.
    Structural(Identifier),
    /// A guide line only; never affects parenting.
    Visual(Identifier),
}

impl Relationship {
    pub fn target(&self) -> &Identifier {
        match self {
            Relationship::Structural(id) | Relationship::Visual(id) => id,
        }
    }
}

/// Scene handles produced by building one proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    /// The shape the artist manipulates.
    pub handle: Handle,
    /// The container holding the shape's rest pose.
    pub offset_handle: Handle,
    /// Helper objects the scene created alongside the shape.
    pub auxiliary_handles: Vec<Handle>,
    pub identifier: Identifier,
}

/// A named, posed, identity-bearing placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    name: String,
    identifier: Identifier,
    parent: Option<Identifier>,
    meta_parent: Option<Identifier>,
    role: Option<String>,
    transform: Transform,
    offset_transform: Option<Transform>,
    shape: Option<ShapeDescriptor>,
    locator_scale: f64,
    attributes: Record,
    metadata: Record,
}

impl Default for Proxy {
    fn default() -> Self {
        Proxy {
            name: DEFAULT_PROXY_NAME.to_string(),
            identifier: Identifier::generate(),
            parent: None,
            meta_parent: None,
            role: None,
            transform: Transform::IDENTITY,
            offset_transform: None,
            shape: Some(ShapeDescriptor::locator(DEFAULT_PROXY_NAME)),
            locator_scale: 1.0,
            attributes: Record::new(),
            metadata: Record::new(),
        }
    }
}

impl Proxy {
    /// Creates a proxy with a fresh identifier and a locator shape.
    pub fn new(name: &str) -> Self {
        let mut proxy = Proxy::default();
        proxy.set_name(name);
        proxy
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn parent_identifier(&self) -> Option<&Identifier> {
        self.parent.as_ref()
    }

    pub fn meta_parent(&self) -> Option<&Identifier> {
        self.meta_parent.as_ref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn offset_transform(&self) -> Option<&Transform> {
        self.offset_transform.as_ref()
    }

    pub fn shape_descriptor(&self) -> Option<&ShapeDescriptor> {
        self.shape.as_ref()
    }

    pub fn locator_scale(&self) -> f64 {
        self.locator_scale
    }

    pub fn attributes(&self) -> &Record {
        &self.attributes
    }

    /// Free-form metadata, without the reserved meta-parent and role keys.
    pub fn metadata(&self) -> &Record {
        &self.metadata
    }

    /// Returns both kinds of outgoing edges.
    pub fn relationships(&self) -> Vec<Relationship> {
        let mut out = Vec::with_capacity(2);
        if let Some(id) = &self.parent {
            out.push(Relationship::Structural(id.clone()));
        }
        if let Some(id) = &self.meta_parent {
            out.push(Relationship::Visual(id.clone()));
        }
        out
    }

    /// The proxy a guide connector should be drawn to.
    ///
    /// The meta-parent wins over the structural parent when both are set.
    pub fn connector_target(&self) -> Option<&Identifier> {
        self.meta_parent.as_ref().or(self.parent.as_ref())
    }

    /// Checks the proxy invariants: a non-empty name and a shape.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.shape.is_none() {
            return Err(ValidationError::MissingShape {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    // -------------------------------------------------------------------------
    // Strict setters
    // -------------------------------------------------------------------------

    pub fn try_set_name(&mut self, name: &str) -> Result<(), ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ValidationError::NameTooLong {
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        self.name = name.to_string();
        if let Some(shape) = &mut self.shape {
            shape.label = name.to_string();
        }
        Ok(())
    }

    pub fn try_set_uuid(&mut self, value: &str) -> Result<(), ValidationError> {
        let id = Identifier::parse(value)?;
        if self.parent.as_ref() == Some(&id) || self.meta_parent.as_ref() == Some(&id) {
            return Err(ValidationError::SelfParent {
                identifier: id.to_string(),
            });
        }
        self.identifier = id;
        Ok(())
    }

    pub fn try_set_parent_identifier(&mut self, value: &str) -> Result<(), ValidationError> {
        self.parent = Some(self.checked_link(value)?);
        Ok(())
    }

    pub fn try_add_meta_parent(&mut self, value: &str) -> Result<(), ValidationError> {
        self.meta_parent = Some(self.checked_link(value)?);
        Ok(())
    }

    pub fn try_set_role(&mut self, role: &str) -> Result<(), ValidationError> {
        if role.is_empty() {
            return Err(ValidationError::InvalidValue {
                key: keys::ROLE.to_string(),
                reason: "role tag must not be empty",
            });
        }
        self.role = Some(role.to_string());
        Ok(())
    }

    pub fn try_set_transform(&mut self, transform: Transform) -> Result<(), ValidationError> {
        if !transform.is_finite() {
            return Err(ValidationError::NonFinite { field: "transform" });
        }
        self.transform = transform;
        Ok(())
    }

    pub fn try_set_offset_transform(&mut self, transform: Transform) -> Result<(), ValidationError> {
        if !transform.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "offset transform",
            });
        }
        self.offset_transform = Some(transform);
        Ok(())
    }

    /// Sets the shape. With `inherit_name` the proxy takes the shape's
    /// label as its name; otherwise the shape is relabeled after the proxy.
    pub fn try_set_shape_descriptor(
        &mut self,
        mut descriptor: ShapeDescriptor,
        inherit_name: bool,
    ) -> Result<(), ValidationError> {
        if descriptor.kind.is_empty() {
            return Err(ValidationError::InvalidShape);
        }
        if inherit_name {
            if descriptor.label.is_empty() {
                return Err(ValidationError::InvalidShape);
            }
            self.try_set_name(&descriptor.label)?;
            self.shape = Some(descriptor);
            Ok(())
        } else {
            descriptor.label = self.name.clone();
            self.shape = Some(descriptor);
            Ok(())
        }
    }

    pub fn try_add_color(&mut self, rgb: &[f64]) -> Result<(), ValidationError> {
        if rgb.len() != 3 {
            return Err(ValidationError::ColorComponents { count: rgb.len() });
        }
        if rgb.iter().any(|c| !c.is_finite()) {
            return Err(ValidationError::NonFinite { field: "color" });
        }
        self.attributes
            .insert(keys::AUTO_COLOR.to_string(), Value::Bool(false));
        self.attributes.insert(
            keys::COLOR_DEFAULT.to_string(),
            Value::from([rgb[0], rgb[1], rgb[2]]),
        );
        Ok(())
    }

    pub fn try_set_locator_scale(&mut self, scale: f64) -> Result<(), ValidationError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ValidationError::InvalidLocatorScale { value: scale });
        }
        self.locator_scale = scale;
        Ok(())
    }

    pub fn try_set_attribute(&mut self, key: &str, value: Value) -> Result<(), ValidationError> {
        check_entry(key, &value)?;
        self.attributes.insert(key.to_string(), value);
        Ok(())
    }

    /// Sets a metadata entry. The reserved meta-parent and role keys are
    /// routed to their dedicated setters; `Null` clears them.
    pub fn try_set_metadata(&mut self, key: &str, value: Value) -> Result<(), ValidationError> {
        match (key, &value) {
            (keys::META_PARENT, Value::Null) => {
                self.meta_parent = None;
                Ok(())
            }
            (keys::META_PARENT, Value::Text(id)) => self.try_add_meta_parent(id),
            (keys::ROLE, Value::Null) => {
                self.role = None;
                Ok(())
            }
            (keys::ROLE, Value::Text(role)) => self.try_set_role(role),
            (keys::META_PARENT | keys::ROLE, _) => Err(ValidationError::InvalidValue {
                key: key.to_string(),
                reason: "expected text",
            }),
            _ => {
                check_entry(key, &value)?;
                self.metadata.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Tolerant setters
    // -------------------------------------------------------------------------

    pub fn set_name(&mut self, name: &str) {
        let result = self.try_set_name(name);
        self.tolerate("set_name", result);
    }

    pub fn set_uuid(&mut self, value: &str) {
        let result = self.try_set_uuid(value);
        self.tolerate("set_uuid", result);
    }

    pub fn set_parent_identifier(&mut self, value: &str) {
        let result = self.try_set_parent_identifier(value);
        self.tolerate("set_parent_identifier", result);
    }

    pub fn set_parent_identifier_from(&mut self, other: &Proxy) {
        let result = self.try_set_parent_identifier(other.identifier.as_str());
        self.tolerate("set_parent_identifier_from", result);
    }

    pub fn clear_parent_identifier(&mut self) {
        self.parent = None;
    }

    pub fn add_meta_parent(&mut self, value: &str) {
        let result = self.try_add_meta_parent(value);
        self.tolerate("add_meta_parent", result);
    }

    pub fn add_meta_parent_from(&mut self, other: &Proxy) {
        let result = self.try_add_meta_parent(other.identifier.as_str());
        self.tolerate("add_meta_parent_from", result);
    }

    pub fn clear_meta_parent(&mut self) {
        self.meta_parent = None;
    }

    pub fn set_role(&mut self, role: &str) {
        let result = self.try_set_role(role);
        self.tolerate("set_role", result);
    }

    pub fn set_transform(&mut self, transform: Transform) {
        let result = self.try_set_transform(transform);
        self.tolerate("set_transform", result);
    }

    pub fn set_offset_transform(&mut self, transform: Transform) {
        let result = self.try_set_offset_transform(transform);
        self.tolerate("set_offset_transform", result);
    }

    pub fn clear_offset_transform(&mut self) {
        self.offset_transform = None;
    }

    pub fn set_position(&mut self, position: Vec3) {
        let transform = Transform {
            position,
            ..self.transform
        };
        let result = self.try_set_transform(transform);
        self.tolerate("set_position", result);
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        let transform = Transform {
            rotation,
            ..self.transform
        };
        let result = self.try_set_transform(transform);
        self.tolerate("set_rotation", result);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        let transform = Transform { scale, ..self.transform };
        let result = self.try_set_transform(transform);
        self.tolerate("set_scale", result);
    }

    pub fn set_offset_position(&mut self, position: Vec3) {
        let transform = Transform {
            position,
            ..self.offset_or_identity()
        };
        let result = self.try_set_offset_transform(transform);
        self.tolerate("set_offset_position", result);
    }

    pub fn set_offset_rotation(&mut self, rotation: Vec3) {
        let transform = Transform {
            rotation,
            ..self.offset_or_identity()
        };
        let result = self.try_set_offset_transform(transform);
        self.tolerate("set_offset_rotation", result);
    }

    pub fn set_offset_scale(&mut self, scale: Vec3) {
        let transform = Transform {
            scale,
            ..self.offset_or_identity()
        };
        let result = self.try_set_offset_transform(transform);
        self.tolerate("set_offset_scale", result);
    }

    /// Sets the posed and the rest position together, so the pose starts
    /// out zeroed relative to the rest pose.
    pub fn set_initial_position(&mut self, position: Vec3) {
        if !transform::is_finite(&position) {
            self.tolerate(
                "set_initial_position",
                Err(ValidationError::NonFinite { field: "position" }),
            );
            return;
        }
        self.transform.position = position;
        self.offset_transform = Some(Transform {
            position,
            ..self.offset_or_identity()
        });
    }

    pub fn set_shape_descriptor(&mut self, descriptor: ShapeDescriptor, inherit_name: bool) {
        let result = self.try_set_shape_descriptor(descriptor, inherit_name);
        self.tolerate("set_shape_descriptor", result);
    }

    pub fn clear_shape_descriptor(&mut self) {
        self.shape = None;
    }

    /// Pins an explicit color. Anything but three finite components is a no-op.
    pub fn add_color(&mut self, rgb: &[f64]) {
        if let Err(err) = self.try_add_color(rgb) {
            debug!(proxy = %self.name, error = %err, "ignoring color");
        }
    }

    pub fn set_locator_scale(&mut self, scale: f64) {
        let result = self.try_set_locator_scale(scale);
        self.tolerate("set_locator_scale", result);
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<Value>) {
        let result = self.try_set_attribute(key, value.into());
        self.tolerate("set_attribute", result);
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.shift_remove(key)
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        let result = self.try_set_metadata(key, value.into());
        self.tolerate("set_metadata", result);
    }

    // -------------------------------------------------------------------------
    // Builder helpers for module templates
    // -------------------------------------------------------------------------

    pub fn with_role(mut self, role: &str) -> Self {
        self.set_role(role);
        self
    }

    pub fn with_initial_position(mut self, position: Vec3) -> Self {
        self.set_initial_position(position);
        self
    }

    pub fn with_parent(mut self, parent: &Proxy) -> Self {
        self.set_parent_identifier_from(parent);
        self
    }

    pub fn with_meta_parent(mut self, meta_parent: &Proxy) -> Self {
        self.add_meta_parent_from(meta_parent);
        self
    }

    pub fn with_shape(mut self, descriptor: ShapeDescriptor) -> Self {
        self.set_shape_descriptor(descriptor, false);
        self
    }

    pub fn with_locator_scale(mut self, scale: f64) -> Self {
        self.set_locator_scale(scale);
        self
    }

    // -------------------------------------------------------------------------
    // Scene interaction
    // -------------------------------------------------------------------------

    /// Materializes the proxy under its own name.
    ///
    /// Returns `None` (and logs) when the proxy is invalid or the scene
    /// fails; nothing is raised to the caller.
    pub fn build(&self, scene: &mut dyn Scene) -> Option<BuildResult> {
        self.build_as(scene, &self.name)
    }

    /// Materializes the proxy with `scene_name` as its object name.
    pub fn build_as(&self, scene: &mut dyn Scene, scene_name: &str) -> Option<BuildResult> {
        if let Err(err) = self.validate() {
            warn!(proxy = %self.name, error = %err, "skipping invalid proxy");
            return None;
        }
        let shape = self.shape.as_ref()?;
        match self.materialize(scene, shape, scene_name) {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(proxy = %self.name, error = %err, "scene failed to build proxy");
                None
            }
        }
    }

    /// Creates the offset container and the shape. On failure every object
    /// created so far is deleted again, so a proxy is either fully built or
    /// absent from the scene.
    fn materialize(
        &self,
        scene: &mut dyn Scene,
        shape: &ShapeDescriptor,
        scene_name: &str,
    ) -> Result<BuildResult, SceneError> {
        let mut created = Vec::with_capacity(2);
        let result = self.materialize_into(scene, shape, scene_name, &mut created);
        if result.is_err() {
            for handle in created.into_iter().rev() {
                if let Err(err) = scene.delete(handle) {
                    warn!(proxy = %self.name, error = %err, "could not discard partially built object");
                }
            }
        }
        result
    }

    fn materialize_into(
        &self,
        scene: &mut dyn Scene,
        shape: &ShapeDescriptor,
        scene_name: &str,
        created: &mut Vec<Handle>,
    ) -> Result<BuildResult, SceneError> {
        let offset_handle = scene.create_container(&format!("{}_offset", scene_name))?;
        created.push(offset_handle);
        let handle = scene.create_shape(shape, scene_name)?;
        created.push(handle);
        scene.apply_field(handle, keys::UUID, &Value::Text(self.identifier.to_string()))?;
        scene.reparent(handle, offset_handle)?;

        scene.set_world_transform(offset_handle, &self.offset_or_identity())?;
        scene.set_world_transform(handle, &self.transform)?;

        if scene.has_field(handle, keys::LOCATOR_SCALE) {
            scene.apply_field(handle, keys::LOCATOR_SCALE, &Value::Float(self.locator_scale))?;
        }

        Ok(BuildResult {
            handle,
            offset_handle,
            auxiliary_handles: scene.auxiliary_handles(handle),
            identifier: self.identifier.clone(),
        })
    }

    /// Pulls the pose and unlocked user fields back from the live object.
    ///
    /// The identifier and scale-knob fields are never overwritten. On any
    /// read failure the proxy is left untouched.
    pub fn refresh_from_live_scene(&mut self, scene: &dyn Scene) -> &mut Self {
        match self.read_live(scene) {
            Ok(Some((transform, fields))) => {
                self.transform = transform;
                for (key, value) in fields {
                    self.attributes.insert(key, value);
                }
            }
            Ok(None) => {
                debug!(proxy = %self.name, "proxy is not materialized, nothing to refresh");
            }
            Err(err) => {
                warn!(proxy = %self.name, error = %err, "failed to refresh proxy from scene");
            }
        }
        self
    }

    fn read_live(&self, scene: &dyn Scene) -> Result<Option<(Transform, Record)>, SceneError> {
        let Some(handle) = scene.find_by_identifier(&self.identifier) else {
            return Ok(None);
        };
        let transform = scene.get_world_transform(handle)?;
        if !transform.is_finite() {
            return Err(SceneError::Rejected {
                operation: "get_world_transform",
                reason: "non-finite transform".to_string(),
            });
        }

        let mut fields = Record::new();
        for field in scene.read_fields(handle)? {
            if field.locked || keys::RESERVED_LIVE_FIELDS.contains(&field.key.as_str()) {
                continue;
            }
            if field.value.validate().is_some() {
                continue;
            }
            fields.insert(field.key, field.value);
        }
        Ok(Some((transform, fields)))
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn offset_or_identity(&self) -> Transform {
        self.offset_transform.unwrap_or_default()
    }

    fn checked_link(&self, value: &str) -> Result<Identifier, ValidationError> {
        let id = Identifier::parse(value)?;
        if id == self.identifier {
            return Err(ValidationError::SelfParent {
                identifier: id.to_string(),
            });
        }
        Ok(id)
    }

    fn tolerate(&self, setter: &'static str, result: Result<(), ValidationError>) {
        if let Err(err) = result {
            warn!(proxy = %self.name, setter, error = %err, "rejected value, keeping previous state");
        }
    }
}

fn check_entry(key: &str, value: &Value) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::InvalidValue {
            key: String::new(),
            reason: "key must not be empty",
        });
    }
    if let Some(reason) = value.validate() {
        return Err(ValidationError::InvalidValue {
            key: key.to_string(),
            reason,
        });
    }
    Ok(())
}
