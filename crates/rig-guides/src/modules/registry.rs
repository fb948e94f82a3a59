//! Registry of known module types.
//!
//! Modules are addressed by type name in documents, so loading a document
//! needs a way back from a name to a default instance. The registry maps
//! each name to a constructor; the built-in one is shared and immutable.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{Module, GENERIC_MODULE};
use crate::modules::{arm, head, leg, root, spine};

/// Builds a module of one type with its default proxies.
pub type ModuleConstructor = fn() -> Module;

lazy_static::lazy_static! {
    static ref BUILTIN: Arc<ModuleRegistry> = {
        let mut registry = ModuleRegistry::new();
        registry.register(GENERIC_MODULE, || Module::generic("module"));
        registry.register(root::TYPE_NAME, root::new);
        registry.register(spine::TYPE_NAME, spine::new);
        registry.register(head::TYPE_NAME, head::new);
        registry.register(arm::TYPE_NAME, arm::new);
        registry.register(leg::TYPE_NAME, leg::new);
        Arc::new(registry)
    };
}

/// Maps module type names to constructors.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    constructors: IndexMap<String, ModuleConstructor>,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared registry of built-in module types.
    pub fn builtin() -> Arc<ModuleRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Registers (or replaces) a constructor under `type_name`.
    pub fn register(&mut self, type_name: &str, constructor: ModuleConstructor) {
        self.constructors.insert(type_name.to_string(), constructor);
    }

    /// Returns true if `type_name` is registered verbatim.
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered type names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Resolves a possibly non-canonical name to a registered one.
    ///
    /// Tries, case-insensitively: the name itself, the name without a
    /// `Module` prefix, and the name with a `Module` prefix.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let mut candidates = vec![name.to_string()];
        if let Some(bare) = strip_prefix_ignore_case(name, GENERIC_MODULE) {
            if !bare.is_empty() {
                candidates.push(bare.to_string());
            }
        }
        candidates.push(format!("{}{}", GENERIC_MODULE, name));

        candidates.iter().find_map(|candidate| {
            self.constructors
                .get_key_value(candidate.as_str())
                .or_else(|| {
                    self.constructors
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(candidate))
                })
                .map(|(key, _)| key.as_str())
        })
    }

    /// Instantiates a default module of the (resolved) type.
    pub fn instantiate(&self, name: &str) -> Option<Module> {
        let resolved = self.resolve(name)?;
        self.constructors.get(resolved).map(|constructor| constructor())
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = ModuleRegistry::builtin();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["Module", "Root", "Spine", "Head", "Arm", "Leg"]);
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = ModuleRegistry::builtin();
        let b = ModuleRegistry::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_resolve_variants() {
        let registry = ModuleRegistry::builtin();
        assert_eq!(registry.resolve("Arm"), Some("Arm"));
        assert_eq!(registry.resolve("arm"), Some("Arm"));
        assert_eq!(registry.resolve("ModuleArm"), Some("Arm"));
        assert_eq!(registry.resolve("moduleLeg"), Some("Leg"));
        assert_eq!(registry.resolve("Module"), Some("Module"));
        assert_eq!(registry.resolve("Tail"), None);
    }

    #[test]
    fn test_resolve_module_prefixed_registration() {
        let mut registry = ModuleRegistry::new();
        registry.register("ModuleTail", || Module::new("ModuleTail", "tail"));
        assert_eq!(registry.resolve("Tail"), Some("ModuleTail"));
        assert_eq!(registry.resolve("ModuleTail"), Some("ModuleTail"));
    }

    #[test]
    fn test_instantiate() {
        let registry = ModuleRegistry::builtin();
        let arm = registry.instantiate("arm").unwrap();
        assert_eq!(arm.type_name(), "Arm");
        assert!(arm.is_valid());

        let shell = registry.instantiate("Module").unwrap();
        assert!(shell.proxies().is_empty());

        assert!(registry.instantiate("Wing").is_none());
    }
}
