//! Module and project records.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::keys;
use crate::model::{Identifier, Module, Project, Proxy, Record, Value};
use crate::modules::ModuleRegistry;

impl Module {
    /// Serializes the module. Proxies are keyed by identifier.
    pub fn to_record(&self, include_type_name: bool) -> Record {
        let mut record = Record::new();
        if include_type_name {
            record.insert(keys::TYPE.to_string(), Value::from(self.type_name()));
        }
        record.insert(keys::NAME.to_string(), Value::from(self.name()));
        record.insert(keys::PREFIX.to_string(), optional_text(self.prefix()));
        record.insert(
            keys::PARENT.to_string(),
            optional_text(self.parent_identifier().map(Identifier::as_str)),
        );
        record.insert(keys::METADATA.to_string(), Value::Map(self.metadata().clone()));

        let proxies: Record = self
            .proxies()
            .iter()
            .map(|p| (p.identifier().to_string(), Value::Map(p.to_record(false))))
            .collect();
        record.insert(keys::PROXIES.to_string(), Value::Map(proxies));
        record
    }

    /// Creates a generic module from a record.
    pub fn from_record(record: &Record) -> Module {
        let mut module = Module::generic("module");
        module.load_record(record);
        module
    }

    /// Loads a record into this module.
    ///
    /// Scalar fields patch like a proxy record does, but a `proxies` entry
    /// replaces the whole proxy list. Keys that are not identifiers get a
    /// stable identity derived from the module and the key.
    pub fn load_record(&mut self, record: &Record) -> &mut Self {
        if let Some(value) = record.get(keys::NAME) {
            match value.as_str() {
                Some(name) => self.set_name(name),
                None => self.reject_entry(keys::NAME, "expected text"),
            }
        }
        if let Some(value) = record.get(keys::PREFIX) {
            match value {
                Value::Null => self.set_prefix(None),
                Value::Text(prefix) => self.set_prefix(Some(prefix.as_str())),
                _ => self.reject_entry(keys::PREFIX, "expected text or null"),
            }
        }
        if let Some(value) = record.get(keys::PARENT) {
            match value {
                Value::Null => self.clear_parent_identifier(),
                Value::Text(id) => self.set_parent_identifier(id),
                _ => self.reject_entry(keys::PARENT, "expected text or null"),
            }
        }
        if let Some(value) = record.get(keys::METADATA) {
            match value.as_map() {
                Some(metadata) => {
                    for (key, value) in metadata {
                        self.set_metadata(key, value.clone());
                    }
                }
                None => self.reject_entry(keys::METADATA, "expected a map"),
            }
        }
        if let Some(value) = record.get(keys::PROXIES) {
            match value.as_map() {
                Some(proxies) => {
                    let proxies = proxies
                        .iter()
                        .filter_map(|(key, value)| self.load_proxy(key, value))
                        .collect();
                    self.replace_proxies(proxies);
                }
                None => self.reject_entry(keys::PROXIES, "expected a map"),
            }
        }
        self
    }

    fn load_proxy(&self, key: &str, value: &Value) -> Option<Proxy> {
        let Some(record) = value.as_map() else {
            warn!(module = %self.name(), key, "proxy record is not a map, skipping");
            return None;
        };
        let identifier = Identifier::parse(key).unwrap_or_else(|_| {
            let seed = format!("rig-guides:proxy:{}:{}:{}", self.type_name(), self.name(), key);
            let derived = Identifier::derived(seed.as_bytes());
            debug!(module = %self.name(), key, identifier = %derived, "derived identifier for proxy key");
            derived
        });

        let mut proxy = Proxy::default();
        proxy.set_uuid(identifier.as_str());
        proxy.patch_from_record(record);

        // Shapes are not persisted; take them from the default proxy with
        // the same role.
        let shape = proxy
            .role()
            .and_then(|role| self.proxy_by_role(role))
            .and_then(Proxy::shape_descriptor)
            .cloned();
        if let Some(shape) = shape {
            proxy.set_shape_descriptor(shape, false);
        }
        Some(proxy)
    }

    fn reject_entry(&self, key: &str, reason: &str) {
        warn!(module = %self.name(), key, reason, "ignoring record entry");
    }
}

impl Project {
    /// Serializes the project. Modules are keyed by type name; repeated
    /// types get a `#n` ordinal from the second occurrence on.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(keys::NAME.to_string(), Value::from(self.name()));
        record.insert(keys::PREFIX.to_string(), optional_text(self.prefix()));
        record.insert(keys::METADATA.to_string(), Value::Map(self.metadata().clone()));

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut modules = Record::new();
        for module in self.modules() {
            let count = seen.entry(module.type_name()).or_insert(0);
            *count += 1;
            let key = if *count == 1 {
                module.type_name().to_string()
            } else {
                format!("{}{}{}", module.type_name(), keys::ORDINAL_SEPARATOR, count)
            };
            modules.insert(key, Value::Map(module.to_record(true)));
        }
        record.insert(keys::MODULES.to_string(), Value::Map(modules));
        record
    }

    /// Rebuilds a project against the built-in registry.
    pub fn from_record(record: &Record) -> Project {
        Project::from_record_with(record, ModuleRegistry::builtin())
    }

    pub fn from_record_with(record: &Record, registry: Arc<ModuleRegistry>) -> Project {
        let mut project = Project::with_registry("project", registry);
        project.load_record(record);
        project
    }

    /// Loads a record into this project, replacing its modules when the
    /// record has a `modules` entry.
    ///
    /// Each module record is matched to a registered type through its
    /// `type` field, else its key without ordinal. The registered type's
    /// default instance is then loaded from the record; unknown types fall
    /// back to a generic module shell.
    pub fn load_record(&mut self, record: &Record) -> &mut Self {
        if let Some(name) = record.get(keys::NAME).and_then(Value::as_str) {
            self.set_name(name);
        }
        if let Some(value) = record.get(keys::PREFIX) {
            self.set_prefix(value.as_str());
        }
        if let Some(metadata) = record.get(keys::METADATA).and_then(Value::as_map) {
            for (key, value) in metadata {
                self.set_metadata(key, value.clone());
            }
        }

        let Some(value) = record.get(keys::MODULES) else {
            return self;
        };
        let Some(modules) = value.as_map() else {
            warn!(project = %self.name(), "modules entry is not a map, keeping current modules");
            return self;
        };

        self.clear_modules();
        for (key, value) in modules {
            let Some(module_record) = value.as_map() else {
                warn!(project = %self.name(), key = %key, "module record is not a map, skipping");
                continue;
            };
            let type_name = module_record
                .get(keys::TYPE)
                .and_then(Value::as_str)
                .unwrap_or_else(|| strip_ordinal(key));

            match self.registry().instantiate(type_name) {
                Some(mut module) => {
                    module.load_record(module_record);
                    self.add_module(module);
                }
                None => {
                    warn!(
                        project = %self.name(),
                        type_name,
                        "unknown module type, keeping it as an empty shell"
                    );
                    // The type name is kept so validation reports it and the
                    // record round-trips unchanged.
                    let mut module = Module::new(type_name, type_name);
                    module.load_record(module_record);
                    self.push_module(module);
                }
            }
        }
        self
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn strip_ordinal(key: &str) -> &str {
    match key.rsplit_once(keys::ORDINAL_SEPARATOR) {
        Some((type_name, ordinal)) if ordinal.bytes().all(|b| b.is_ascii_digit()) => type_name,
        _ => key,
    }
}
