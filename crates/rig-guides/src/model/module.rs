//! Modules: ordered groups of proxies forming one rig component.
//!
//! A module owns its proxies exclusively. It attaches to the rest of the
//! graph only through identifiers, so modules can be reordered, serialized
//! or rebuilt independently of each other.

use std::fmt;

use tracing::{debug, warn};

use crate::build::BuildContext;
use crate::error::{SceneError, ValidationError};
use crate::limits::MAX_NAME_LEN;
use crate::model::{BuildResult, Identifier, Proxy, Record, Value};
use crate::scene::Scene;

/// Type name of the generic module shell.
pub const GENERIC_MODULE: &str = "Module";

/// Scene-only decoration run after the whole project has been built and
/// re-parented.
pub type PostBuildHook = fn(&Module, &mut BuildContext<'_>) -> Result<(), SceneError>;

fn no_post_build(_: &Module, _: &mut BuildContext<'_>) -> Result<(), SceneError> {
    Ok(())
}

/// A named group of proxies.
#[derive(Clone)]
pub struct Module {
    type_name: String,
    name: String,
    prefix: Option<String>,
    parent: Option<Identifier>,
    proxies: Vec<Proxy>,
    metadata: Record,
    post_build: PostBuildHook,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("parent", &self.parent)
            .field("proxies", &self.proxies)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl Module {
    /// Creates an empty module of the given type.
    pub fn new(type_name: &str, name: &str) -> Self {
        Module {
            type_name: type_name.to_string(),
            name: name.to_string(),
            prefix: None,
            parent: None,
            proxies: Vec::new(),
            metadata: Record::new(),
            post_build: no_post_build,
        }
    }

    /// Creates an empty generic module shell.
    pub fn generic(name: &str) -> Self {
        Module::new(GENERIC_MODULE, name)
    }

    pub fn with_post_build_hook(mut self, hook: PostBuildHook) -> Self {
        self.post_build = hook;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.set_prefix(Some(prefix));
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn parent_identifier(&self) -> Option<&Identifier> {
        self.parent.as_ref()
    }

    pub fn metadata(&self) -> &Record {
        &self.metadata
    }

    /// Proxies in insertion order.
    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    pub fn proxies_mut(&mut self) -> impl Iterator<Item = &mut Proxy> {
        self.proxies.iter_mut()
    }

    pub fn proxy(&self, identifier: &Identifier) -> Option<&Proxy> {
        self.proxies.iter().find(|p| p.identifier() == identifier)
    }

    pub fn proxy_mut(&mut self, identifier: &Identifier) -> Option<&mut Proxy> {
        self.proxies.iter_mut().find(|p| p.identifier() == identifier)
    }

    /// Finds the proxy tagged with `role`.
    pub fn proxy_by_role(&self, role: &str) -> Option<&Proxy> {
        self.proxies.iter().find(|p| p.role() == Some(role))
    }

    pub fn proxy_by_role_mut(&mut self, role: &str) -> Option<&mut Proxy> {
        self.proxies.iter_mut().find(|p| p.role() == Some(role))
    }

    /// The parent a proxy attaches to: its own, or the module's for proxies
    /// that declare none.
    pub fn effective_parent<'a>(&'a self, proxy: &'a Proxy) -> Option<&'a Identifier> {
        proxy.parent_identifier().or(self.parent.as_ref())
    }

    /// The proxy a guide connector from `proxy` is drawn to: its meta-parent,
    /// else its effective parent.
    pub fn connector_target<'a>(&'a self, proxy: &'a Proxy) -> Option<&'a Identifier> {
        proxy.connector_target().or(self.parent.as_ref())
    }

    /// Object name used in the scene: `<prefix>_<proxy name>`.
    pub fn scene_name(&self, proxy: &Proxy) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, proxy.name()),
            None => proxy.name().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.proxies.is_empty() {
            return Err(ValidationError::EmptyModule {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// A module is valid when it owns at least one proxy.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    pub fn set_name(&mut self, name: &str) {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            warn!(module = %self.name, name, "rejected module name");
            return;
        }
        self.name = name.to_string();
    }

    /// Sets or clears the scene-name prefix. An empty prefix clears it.
    pub fn set_prefix(&mut self, prefix: Option<&str>) {
        self.prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
    }

    pub fn try_set_parent_identifier(&mut self, value: &str) -> Result<(), ValidationError> {
        let id = Identifier::parse(value)?;
        if self.proxy(&id).is_some() {
            return Err(ValidationError::SelfParent {
                identifier: id.to_string(),
            });
        }
        self.parent = Some(id);
        Ok(())
    }

    pub fn set_parent_identifier(&mut self, value: &str) {
        if let Err(err) = self.try_set_parent_identifier(value) {
            warn!(module = %self.name, error = %err, "rejected module parent");
        }
    }

    pub fn set_parent_identifier_from(&mut self, proxy: &Proxy) {
        self.set_parent_identifier(proxy.identifier().as_str());
    }

    pub fn clear_parent_identifier(&mut self) {
        self.parent = None;
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if key.is_empty() || value.validate().is_some() {
            warn!(module = %self.name, key, "rejected module metadata");
            return;
        }
        self.metadata.insert(key.to_string(), value);
    }

    /// Appends a proxy. A proxy whose identifier is already owned by this
    /// module is skipped.
    pub fn add_proxy(&mut self, proxy: Proxy) -> bool {
        if self.proxy(proxy.identifier()).is_some() {
            debug!(
                module = %self.name,
                proxy = %proxy.name(),
                identifier = %proxy.identifier(),
                "skipping proxy with duplicate identifier"
            );
            return false;
        }
        self.proxies.push(proxy);
        true
    }

    /// Appends several proxies, returning how many were accepted.
    pub fn add_proxies(&mut self, proxies: impl IntoIterator<Item = Proxy>) -> usize {
        let mut added = 0;
        for proxy in proxies {
            if self.add_proxy(proxy) {
                added += 1;
            }
        }
        added
    }

    pub fn remove_proxy(&mut self, identifier: &Identifier) -> Option<Proxy> {
        let index = self.proxies.iter().position(|p| p.identifier() == identifier)?;
        Some(self.proxies.remove(index))
    }

    pub(crate) fn replace_proxies(&mut self, proxies: Vec<Proxy>) {
        self.proxies.clear();
        self.add_proxies(proxies);
    }

    // -------------------------------------------------------------------------
    // Scene interaction
    // -------------------------------------------------------------------------

    /// Builds every proxy in list order, collecting the successful results.
    ///
    /// Proxies are not parented here; the orchestrator re-parents across the
    /// whole project once every module has built.
    pub fn build_proxies(&self, scene: &mut dyn Scene) -> Vec<BuildResult> {
        self.proxies
            .iter()
            .filter_map(|proxy| proxy.build_as(scene, &self.scene_name(proxy)))
            .collect()
    }

    /// Runs the module's post-build decoration.
    pub fn post_build_hook(&self, ctx: &mut BuildContext<'_>) -> Result<(), SceneError> {
        (self.post_build)(self, ctx)
    }

    /// Refreshes every proxy from the live scene.
    pub fn refresh_from_live_scene(&mut self, scene: &dyn Scene) -> &mut Self {
        for proxy in &mut self.proxies {
            proxy.refresh_from_live_scene(scene);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;

    fn leg() -> Module {
        let hip = Proxy::new("hip").with_role("hip");
        let knee = Proxy::new("knee").with_role("knee").with_parent(&hip);
        let mut module = Module::generic("leg");
        module.add_proxies([hip, knee]);
        module
    }

    #[test]
    fn test_empty_module_is_invalid() {
        let module = Module::generic("empty");
        assert!(matches!(
            module.validate(),
            Err(ValidationError::EmptyModule { .. })
        ));
        assert!(leg().is_valid());
    }

    #[test]
    fn test_add_proxy_skips_duplicates() {
        let mut module = leg();
        let copy = module.proxies()[0].clone();
        assert!(!module.add_proxy(copy));
        assert_eq!(module.proxies().len(), 2);
        assert_eq!(module.add_proxies([Proxy::new("ankle"), Proxy::new("toe")]), 2);
        assert_eq!(module.proxies().len(), 4);
    }

    #[test]
    fn test_proxy_by_role() {
        let module = leg();
        assert_eq!(module.proxy_by_role("knee").unwrap().name(), "knee");
        assert!(module.proxy_by_role("elbow").is_none());
    }

    #[test]
    fn test_effective_parent_falls_back_to_module() {
        let spine = Proxy::new("pelvis");
        let mut module = leg();
        module.set_parent_identifier_from(&spine);

        let hip = module.proxy_by_role("hip").unwrap();
        let knee = module.proxy_by_role("knee").unwrap();
        assert_eq!(module.effective_parent(hip), Some(spine.identifier()));
        assert_eq!(module.effective_parent(knee), Some(hip.identifier()));
    }

    #[test]
    fn test_module_parent_cannot_be_own_proxy() {
        let mut module = leg();
        let own = module.proxies()[0].identifier().to_string();
        module.set_parent_identifier(&own);
        assert!(module.parent_identifier().is_none());

        module.set_parent_identifier("garbage id");
        assert!(module.parent_identifier().is_none());
    }

    #[test]
    fn test_build_proxies_uses_prefix_and_order() {
        let mut scene = MemoryScene::new();
        let module = leg().with_prefix("l");
        let results = module.build_proxies(&mut scene);

        assert_eq!(results.len(), 2);
        assert_eq!(scene.name_of(results[0].handle), Some("l_hip"));
        assert_eq!(scene.name_of(results[1].handle), Some("l_knee"));
        // Not parented to each other yet
        assert_eq!(scene.parent_of(results[1].offset_handle), None);
    }

    #[test]
    fn test_build_proxies_skips_failures() {
        let mut scene = MemoryScene::new();
        scene.fail_shape("hip");
        let results = leg().build_proxies(&mut scene);
        assert_eq!(results.len(), 1);
        assert_eq!(scene.name_of(results[0].handle), Some("knee"));
    }
}
