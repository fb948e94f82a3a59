//! The ordered build pipeline.

use tracing::{debug, info, info_span, warn};

use crate::build::{BuildContext, BuildIndex, BuildOptions, BuildPhase, BuildReport, ModuleBuild};
use crate::error::SceneError;
use crate::keys;
use crate::model::{BuildResult, Identifier, Module, Project, Proxy};
use crate::scene::{Handle, Scene};
use crate::validate::parent_cycle_members;

/// Attribute keys applied during side-dressing rather than with the other
/// custom attributes.
const COLOR_KEYS: [&str; 2] = [keys::AUTO_COLOR, keys::COLOR_DEFAULT];

/// A downstream pass that turns posed proxies into a skeleton.
///
/// The project only sequences the pass over its valid modules; what gets
/// created is up to the implementation.
pub trait SkeletonPass {
    fn build_module(&mut self, module: &Module, scene: &mut dyn Scene) -> Result<(), SceneError>;
}

impl Project {
    /// Builds every proxy of every module with default options.
    pub fn build_proxy(&self, scene: &mut dyn Scene) -> BuildReport {
        self.build_proxy_with(scene, &BuildOptions::default())
    }

    /// Materializes the whole project.
    ///
    /// Invalid modules and proxies, unresolved parents and failing scene
    /// calls are skipped with a log entry; the run itself never fails.
    pub fn build_proxy_with(&self, scene: &mut dyn Scene, options: &BuildOptions) -> BuildReport {
        let span = info_span!("build_proxy", project = %self.name());
        let _enter = span.enter();

        if let Err(err) = self.validate() {
            warn!(error = %err, "project is not valid, building what remains");
        }

        let mut report = BuildReport::default();
        let mut index = BuildIndex::new();

        // 1. Root and setup containers
        report.root = logged(
            &options.root_name,
            "create_container",
            scene.create_container(&options.root_name),
        );
        report.setup = logged(
            &options.setup_name,
            "create_container",
            scene.create_container(&options.setup_name),
        );
        if let (Some(root), Some(setup)) = (report.root, report.setup) {
            logged(&options.setup_name, "reparent", scene.reparent(setup, root));
        }

        // 2. Proxies of every module, flattened into one index
        let mut built = Vec::with_capacity(self.modules().len());
        for module in self.modules() {
            let mut entry = ModuleBuild {
                name: module.name().to_string(),
                type_name: module.type_name().to_string(),
                phase: BuildPhase::Declared,
                built: 0,
            };
            match module.validate() {
                Err(err) => {
                    warn!(module = %module.name(), error = %err, "skipping invalid module");
                    report.skipped.push(module.name().to_string());
                    built.push(false);
                }
                Ok(()) => {
                    let results = module.build_proxies(scene);
                    for proxy in module.proxies() {
                        if !results.iter().any(|r| &r.identifier == proxy.identifier()) {
                            report
                                .skipped
                                .push(format!("{}/{}", module.name(), proxy.name()));
                        }
                    }
                    entry.built = results.len();
                    entry.phase = BuildPhase::ProxiesBuilt;
                    for result in results {
                        index.insert(result.clone());
                        report.results.push(result);
                    }
                    built.push(true);
                }
            }
            report.modules.push(entry);
        }
        debug!(proxies = report.results.len(), "proxies built");

        // 3. Side-dressing
        for (_, proxy, result) in built_proxies(self, &built, &index) {
            dress(scene, proxy, result, report.root, report.setup, options);
        }

        // 4. Structural parenting by identity
        let cycles = parent_cycle_members(self);
        for (module, proxy, result) in built_proxies(self, &built, &index) {
            let Some(parent) = module.effective_parent(proxy) else {
                continue;
            };
            if cycles.contains(proxy.identifier()) {
                warn!(proxy = %proxy.name(), parent = %parent, "parent chain forms a cycle, leaving proxy unparented");
                continue;
            }
            let Some(parent_handle) = resolve(scene, &index, parent) else {
                debug!(proxy = %proxy.name(), parent = %parent, "parent not built, skipping");
                continue;
            };
            match scene.reparent(result.offset_handle, parent_handle) {
                Ok(true) => report.reparented += 1,
                Ok(false) => {
                    warn!(proxy = %proxy.name(), parent = %parent, "scene refused re-parent");
                }
                Err(err) => {
                    warn!(proxy = %proxy.name(), error = %err, "re-parent failed");
                }
            }
        }
        advance(&mut report, &built, BuildPhase::Reparented);

        // 5. Guide connectors
        if options.draw_connectors {
            for (module, proxy, result) in built_proxies(self, &built, &index) {
                let Some(target) = module.connector_target(proxy) else {
                    continue;
                };
                let Some(target_handle) = resolve(scene, &index, target) else {
                    continue;
                };
                if let Some(connector) = logged(
                    proxy.name(),
                    "draw_connector",
                    scene.draw_connector(result.handle, target_handle),
                ) {
                    report.connectors.push(connector);
                }
            }
        }

        // 6. Custom attributes
        for (_, proxy, result) in built_proxies(self, &built, &index) {
            for (key, value) in proxy.attributes() {
                if COLOR_KEYS.contains(&key.as_str()) {
                    continue;
                }
                logged(proxy.name(), "apply_field", scene.apply_field(result.handle, key, value));
            }
        }

        // 7. Module decoration
        let mut ctx = BuildContext::new(&mut *scene, &index, report.root, report.setup);
        let mut decorated = vec![false; built.len()];
        for (i, module) in self.modules().iter().enumerate() {
            if !built[i] {
                continue;
            }
            match module.post_build_hook(&mut ctx) {
                Ok(()) => decorated[i] = true,
                Err(err) => {
                    warn!(module = %module.name(), error = %err, "post-build hook failed");
                }
            }
        }
        advance(&mut report, &decorated, BuildPhase::PostProcessed);

        info!(
            proxies = report.results.len(),
            reparented = report.reparented,
            connectors = report.connectors.len(),
            skipped = report.skipped.len(),
            "build finished"
        );
        report
    }

    /// Runs a downstream skeleton pass over every valid module, in
    /// declaration order. Returns how many modules the pass accepted.
    pub fn build_skeleton(&self, scene: &mut dyn Scene, pass: &mut dyn SkeletonPass) -> usize {
        let span = info_span!("build_skeleton", project = %self.name());
        let _enter = span.enter();

        let mut done = 0;
        for module in self.modules() {
            if let Err(err) = module.validate() {
                warn!(module = %module.name(), error = %err, "skipping invalid module");
                continue;
            }
            match pass.build_module(module, scene) {
                Ok(()) => done += 1,
                Err(err) => warn!(module = %module.name(), error = %err, "skeleton pass failed"),
            }
        }
        done
    }
}

/// Proxies of built modules that materialized, with their results.
fn built_proxies<'p>(
    project: &'p Project,
    built: &'p [bool],
    index: &'p BuildIndex,
) -> impl Iterator<Item = (&'p Module, &'p Proxy, &'p BuildResult)> {
    project
        .modules()
        .iter()
        .zip(built)
        .filter(|(_, built)| **built)
        .flat_map(move |(module, _)| {
            module
                .proxies()
                .iter()
                .filter_map(move |proxy| index.get(proxy.identifier()).map(|r| (module, proxy, r)))
        })
}

fn resolve(scene: &dyn Scene, index: &BuildIndex, identifier: &Identifier) -> Option<Handle> {
    index
        .handle(identifier)
        .or_else(|| scene.find_by_identifier(identifier))
}

/// Pinned colors, auxiliary helpers under the setup container and the
/// offset container under the root.
fn dress(
    scene: &mut dyn Scene,
    proxy: &Proxy,
    result: &BuildResult,
    root: Option<Handle>,
    setup: Option<Handle>,
    options: &BuildOptions,
) {
    if options.apply_colors {
        for key in COLOR_KEYS {
            if let Some(value) = proxy.attributes().get(key) {
                logged(proxy.name(), "apply_field", scene.apply_field(result.handle, key, value));
            }
        }
    }
    if let Some(setup) = setup {
        for aux in &result.auxiliary_handles {
            logged(proxy.name(), "reparent", scene.reparent(*aux, setup));
        }
    }
    if let Some(root) = root {
        logged(proxy.name(), "reparent", scene.reparent(result.offset_handle, root));
    }
}

fn advance(report: &mut BuildReport, reached: &[bool], phase: BuildPhase) {
    for (entry, reached) in report.modules.iter_mut().zip(reached) {
        if *reached {
            entry.phase = phase;
        }
    }
}

/// Logs a failed scene call against the unit that issued it.
fn logged<T>(unit: &str, operation: &'static str, result: Result<T, SceneError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(unit, operation, error = %err, "scene call failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::modules::arm;
    use crate::scene::MemoryScene;

    fn torso() -> Module {
        let chest = Proxy::new("chest").with_role("chest");
        let mut neck = Proxy::new("neck").with_parent(&chest);
        neck.add_color(&[1.0, 1.0, 0.0]);
        neck.set_attribute("twist", 15.0);
        let mut module = Module::generic("torso");
        module.add_proxies([chest, neck]);
        module
    }

    #[test]
    fn test_containers_and_root_grouping() {
        let mut project = Project::new("hero");
        project.add_module(torso());
        let mut scene = MemoryScene::new();

        let report = project.build_proxy(&mut scene);
        let root = report.root.unwrap();
        let setup = report.setup.unwrap();

        assert_eq!(scene.name_of(root), Some("guides"));
        assert_eq!(scene.parent_of(setup), Some(root));
        let chest = &report.results[0];
        assert_eq!(scene.parent_of(chest.offset_handle), Some(root));
        assert_eq!(report.phase_of("torso"), Some(BuildPhase::PostProcessed));
        assert!(report.is_complete());
    }

    #[test]
    fn test_colors_and_attributes_reach_the_scene() {
        let mut project = Project::new("hero");
        project.add_module(torso());
        let mut scene = MemoryScene::new();

        let report = project.build_proxy(&mut scene);
        let neck = report.results[1].handle;
        assert_eq!(scene.field(neck, keys::AUTO_COLOR), Some(&Value::Bool(false)));
        assert_eq!(scene.field(neck, "twist"), Some(&Value::Float(15.0)));

        let mut plain = MemoryScene::new();
        let options = BuildOptions {
            apply_colors: false,
            ..BuildOptions::default()
        };
        let report = project.build_proxy_with(&mut plain, &options);
        let neck = report.results[1].handle;
        assert!(plain.field(neck, keys::AUTO_COLOR).is_none());
        assert_eq!(plain.field(neck, "twist"), Some(&Value::Float(15.0)));
    }

    #[test]
    fn test_connectors_can_be_disabled() {
        let mut project = Project::new("hero");
        project.add_module(torso());

        let mut scene = MemoryScene::new();
        assert_eq!(project.build_proxy(&mut scene).connectors.len(), 1);

        let mut scene = MemoryScene::new();
        let options = BuildOptions {
            draw_connectors: false,
            ..BuildOptions::default()
        };
        assert!(project.build_proxy_with(&mut scene, &options).connectors.is_empty());
        assert!(scene.connectors().is_empty());
    }

    #[test]
    fn test_module_parent_is_effective_parent() {
        let mut spine = Module::generic("spine");
        let chest = Proxy::new("chest");
        spine.add_proxy(chest.clone());

        let mut arm = arm::new();
        arm.set_parent_identifier_from(&chest);

        let mut project = Project::new("hero");
        project.add_modules([arm, spine]);
        let mut scene = MemoryScene::new();
        let report = project.build_proxy(&mut scene);

        let clavicle = project.modules()[0].proxy_by_role("clavicle").unwrap();
        let clavicle = report.result_for(clavicle.identifier()).unwrap();
        let chest = report.result_for(chest.identifier()).unwrap();
        assert_eq!(scene.parent_of(clavicle.offset_handle), Some(chest.handle));
    }

    #[test]
    fn test_cycle_members_stay_under_root() {
        let mut a = Proxy::new("a");
        let mut b = Proxy::new("b");
        a.set_parent_identifier_from(&b);
        b.set_parent_identifier_from(&a);
        let c = Proxy::new("c").with_parent(&a);

        let mut module = Module::generic("loop");
        module.add_proxies([a, b, c]);
        let mut project = Project::new("hero");
        project.add_module(module);

        let mut scene = MemoryScene::new();
        let report = project.build_proxy(&mut scene);
        let root = report.root.unwrap();

        assert_eq!(scene.parent_of(report.results[0].offset_handle), Some(root));
        assert_eq!(scene.parent_of(report.results[1].offset_handle), Some(root));
        assert_eq!(
            scene.parent_of(report.results[2].offset_handle),
            Some(report.results[0].handle)
        );
        assert_eq!(report.reparented, 1);
    }

    #[test]
    fn test_hooks_run_after_parenting() {
        let mut project = Project::new("hero");
        project.add_module(arm::new());
        let mut scene = MemoryScene::new();
        let report = project.build_proxy(&mut scene);

        let module = &project.modules()[0];
        let elbow = report
            .result_for(module.proxy_by_role("elbow").unwrap().identifier())
            .unwrap();
        let pole = report
            .result_for(module.proxy_by_role("elbowPole").unwrap().identifier())
            .unwrap();
        assert!(scene.field(elbow.handle, "limitRotateY").is_some());
        assert_eq!(scene.field(pole.handle, "lockRotate"), Some(&Value::Bool(true)));
        // Annotation moved to the shared setup container
        assert_eq!(scene.parent_of(pole.auxiliary_handles[0]), report.setup);
    }

    #[test]
    fn test_failing_hook_does_not_abort() {
        let mut project = Project::new("hero");
        project.add_module(arm::new());
        let mut scene = MemoryScene::new();
        scene.fail_operation("draw_connector");

        let report = project.build_proxy(&mut scene);
        assert_eq!(report.results.len(), 5);
        assert!(report.connectors.is_empty());
        assert_eq!(report.phase_of("arm"), Some(BuildPhase::Reparented));
    }

    #[test]
    fn test_missing_root_container_still_builds() {
        let mut project = Project::new("hero");
        project.add_module(torso());
        let mut scene = MemoryScene::new();
        scene.fail_operation("create_container");

        let report = project.build_proxy(&mut scene);
        assert!(report.root.is_none());
        // Every proxy needs an offset container, so nothing materializes
        assert!(report.results.is_empty());
        assert_eq!(report.skipped, ["torso/chest", "torso/neck"]);
        assert_eq!(report.phase_of("torso"), Some(BuildPhase::PostProcessed));
    }

    struct CountingPass {
        seen: Vec<String>,
    }

    impl SkeletonPass for CountingPass {
        fn build_module(&mut self, module: &Module, _: &mut dyn Scene) -> Result<(), SceneError> {
            self.seen.push(module.name().to_string());
            Ok(())
        }
    }

    #[test]
    fn test_build_skeleton_skips_invalid_modules() {
        let mut project = Project::new("hero");
        project.add_modules([torso(), Module::generic("empty"), arm::new()]);
        let mut scene = MemoryScene::new();
        let mut pass = CountingPass { seen: Vec::new() };

        assert_eq!(project.build_skeleton(&mut scene, &mut pass), 2);
        assert_eq!(pass.seen, ["torso", "arm"]);
    }
}
