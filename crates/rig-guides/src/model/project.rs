//! Projects: the root aggregate of modules.

use std::sync::Arc;

use tracing::warn;

use crate::error::ValidationError;
use crate::model::{Identifier, Module, Proxy, Record, Value};
use crate::modules::ModuleRegistry;
use crate::scene::Scene;

/// An ordered collection of modules plus project-level metadata.
///
/// The project is the unit of serialization and of building. Modules are
/// only accepted if their type name is known to the project's registry.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    prefix: Option<String>,
    modules: Vec<Module>,
    metadata: Record,
    registry: Arc<ModuleRegistry>,
}

impl Project {
    /// Creates an empty project backed by the built-in module registry.
    pub fn new(name: &str) -> Self {
        Project::with_registry(name, ModuleRegistry::builtin())
    }

    /// Creates an empty project backed by a custom registry.
    pub fn with_registry(name: &str, registry: Arc<ModuleRegistry>) -> Self {
        Project {
            name: name.to_string(),
            prefix: None,
            modules: Vec::new(),
            metadata: Record::new(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn metadata(&self) -> &Record {
        &self.metadata
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> {
        self.modules.iter_mut()
    }

    pub fn set_name(&mut self, name: &str) {
        if name.is_empty() {
            warn!(project = %self.name, "rejected empty project name");
            return;
        }
        self.name = name.to_string();
    }

    pub fn set_prefix(&mut self, prefix: Option<&str>) {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if key.is_empty() || value.validate().is_some() {
            warn!(project = %self.name, key, "rejected project metadata");
            return;
        }
        self.metadata.insert(key.to_string(), value);
    }

    /// Appends a module whose type is registered. Unknown types are
    /// rejected with a warning.
    pub fn add_module(&mut self, module: Module) -> bool {
        if !self.registry.contains(module.type_name()) {
            let err = ValidationError::UnknownModuleType {
                type_name: module.type_name().to_string(),
            };
            warn!(project = %self.name, module = %module.name(), error = %err, "rejected module");
            return false;
        }
        self.modules.push(module);
        true
    }

    /// Appends several modules, returning how many were accepted.
    pub fn add_modules(&mut self, modules: impl IntoIterator<Item = Module>) -> usize {
        let mut added = 0;
        for module in modules {
            if self.add_module(module) {
                added += 1;
            }
        }
        added
    }

    /// Appends without the registry check. Used for generic shells that
    /// stand in for unknown types while loading.
    pub(crate) fn push_module(&mut self, module: Module) {
        self.modules.push(module);
    }

    pub(crate) fn clear_modules(&mut self) {
        self.modules.clear();
    }

    /// First module of the given type.
    pub fn module_by_type(&self, type_name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.type_name() == type_name)
    }

    pub fn module_by_name(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name() == name)
    }

    pub fn module_by_name_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.name() == name)
    }

    /// Every proxy of every module, in declaration order.
    pub fn proxies(&self) -> impl Iterator<Item = (&Module, &Proxy)> {
        self.modules
            .iter()
            .flat_map(|m| m.proxies().iter().map(move |p| (m, p)))
    }

    /// Finds a proxy anywhere in the project.
    pub fn find_proxy(&self, identifier: &Identifier) -> Option<(&Module, &Proxy)> {
        self.proxies().find(|(_, p)| p.identifier() == identifier)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.modules.is_empty() {
            return Err(ValidationError::EmptyProject {
                name: self.name.clone(),
            });
        }
        self.modules.iter().try_for_each(Module::validate)
    }

    /// A project is valid when it owns at least one module and every module
    /// is valid. An invalid project can still be built; invalid units are
    /// skipped.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Refreshes every proxy of every module from the live scene.
    pub fn refresh_from_live_scene(&mut self, scene: &dyn Scene) -> &mut Self {
        for module in &mut self.modules {
            module.refresh_from_live_scene(scene);
        }
        self
    }
}
