//! End-to-end behavior of the guide graph: identity-based parenting,
//! connector targets, best-effort builds and record round trips.

use proptest::prelude::*;

use rig_guides::model::Transform;
use rig_guides::{
    decode_document, encode_document_compressed, MemoryScene, Module, Project, Proxy, Record,
    Value,
};

fn project_of(modules: impl IntoIterator<Item = Module>) -> Project {
    let mut project = Project::new("hero");
    project.add_modules(modules);
    project
}

#[test]
fn test_parent_declared_in_later_module() {
    let y = Proxy::new("y");
    let x = Proxy::new("x").with_parent(&y);

    let mut b = Module::generic("b");
    b.add_proxy(x.clone());
    let mut a = Module::generic("a");
    a.add_proxy(y.clone());

    // B comes first, its parent lives in A
    let project = project_of([b, a]);
    let mut scene = MemoryScene::new();
    let report = project.build_proxy(&mut scene);

    let x_built = report.result_for(x.identifier()).unwrap();
    let y_built = report.result_for(y.identifier()).unwrap();
    assert_eq!(scene.parent_of(x_built.offset_handle), Some(y_built.handle));
    assert_eq!(report.reparented, 1);
}

#[test]
fn test_parent_spelled_without_hyphens_in_upper_case() {
    let hip = Proxy::new("hip");
    let mut knee = Proxy::new("knee");
    knee.set_parent_identifier(&hip.identifier().as_str().replace('-', "").to_uppercase());
    assert_eq!(knee.parent_identifier(), Some(hip.identifier()));

    let mut module = Module::generic("leg");
    module.add_proxies([hip.clone(), knee.clone()]);
    let project = project_of([module]);

    let mut scene = MemoryScene::new();
    let report = project.build_proxy(&mut scene);
    let hip_built = report.result_for(hip.identifier()).unwrap();
    let knee_built = report.result_for(knee.identifier()).unwrap();
    assert_eq!(scene.parent_of(knee_built.offset_handle), Some(hip_built.handle));
    assert_eq!(report.reparented, 1);
}

#[test]
fn test_meta_parent_wins_for_connectors() {
    let y = Proxy::new("y");
    let z = Proxy::new("z");
    let p = Proxy::new("p").with_parent(&y).with_meta_parent(&z);

    let mut module = Module::generic("limb");
    module.add_proxies([y.clone(), z.clone(), p.clone()]);
    let project = project_of([module]);

    let mut scene = MemoryScene::new();
    let report = project.build_proxy(&mut scene);

    let p_built = report.result_for(p.identifier()).unwrap();
    let y_built = report.result_for(y.identifier()).unwrap();
    let z_built = report.result_for(z.identifier()).unwrap();

    assert_eq!(scene.connectors(), vec![(p_built.handle, z_built.handle)]);
    // The structural parent is still the real parent
    assert_eq!(scene.parent_of(p_built.offset_handle), Some(y_built.handle));
}

#[test]
fn test_invalid_module_does_not_stop_build() {
    let mut valid = Module::generic("valid");
    valid.add_proxies([Proxy::new("a"), Proxy::new("b")]);
    let project = project_of([Module::generic("empty"), valid]);

    assert!(!project.is_valid());

    let mut scene = MemoryScene::new();
    let report = project.build_proxy(&mut scene);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.skipped, ["empty"]);
    assert!(scene.find_by_name("a").is_some());
    assert!(scene.find_by_name("b").is_some());
}

#[test]
fn test_scene_failure_skips_only_that_proxy() {
    let hip = Proxy::new("hip");
    let knee = Proxy::new("knee").with_parent(&hip);
    let ankle = Proxy::new("ankle").with_parent(&knee);
    let mut module = Module::generic("leg");
    module.add_proxies([hip, knee.clone(), ankle.clone()]);
    let project = project_of([module]);

    let mut scene = MemoryScene::new();
    scene.fail_shape("hip");
    let report = project.build_proxy(&mut scene);

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.skipped, ["leg/hip"]);
    let knee_built = report.result_for(knee.identifier()).unwrap();
    let ankle_built = report.result_for(ankle.identifier()).unwrap();
    assert_eq!(scene.parent_of(ankle_built.offset_handle), Some(knee_built.handle));
    // Unresolved parent: the knee stays under the root container
    assert_eq!(scene.parent_of(knee_built.offset_handle), report.root);
    // Nothing of the failed hip is left behind
    assert!(scene.find_by_name("hip_offset").is_none());
    assert!(!scene.outline().contains("hip"));
}

#[test]
fn test_parent_outside_project_resolves_through_scene() {
    let mut scene = MemoryScene::new();
    let world = Proxy::new("world");
    let world_built = world.build(&mut scene).unwrap();

    let mut module = Module::generic("prop");
    module.add_proxy(Proxy::new("handle").with_parent(&world));
    let project = project_of([module]);

    let report = project.build_proxy(&mut scene);
    assert_eq!(
        scene.parent_of(report.results[0].offset_handle),
        Some(world_built.handle)
    );
}

#[test]
fn test_hip_knee_scenario() {
    let mut hip = Proxy::new("hip");
    hip.set_initial_position([10.0, 95.0, 0.0]);
    let mut knee = Proxy::new("knee");
    knee.set_parent_identifier_from(&hip);
    knee.set_initial_position([10.0, 50.0, 3.0]);
    knee.set_rotation([0.0, 0.0, 12.5]);

    let mut module = Module::generic("leg");
    module.add_proxies([hip.clone(), knee.clone()]);
    let project = project_of([module]);

    let mut scene = MemoryScene::new();
    let report = project.build_proxy(&mut scene);
    let hip_built = report.result_for(hip.identifier()).unwrap();
    let knee_built = report.result_for(knee.identifier()).unwrap();
    assert_eq!(scene.parent_of(knee_built.offset_handle), Some(hip_built.handle));

    let restored = Project::from_record(&project.to_record());
    let module = &restored.modules()[0];
    assert_eq!(module.proxies().len(), 2);
    let hip_restored = module.proxy(hip.identifier()).unwrap();
    let knee_restored = module.proxy(knee.identifier()).unwrap();
    assert_eq!(hip_restored.transform(), hip.transform());
    assert_eq!(knee_restored.transform(), knee.transform());
    assert_eq!(knee_restored.offset_transform(), knee.offset_transform());
    assert_eq!(knee_restored.parent_identifier(), Some(hip.identifier()));
}

#[test]
fn test_document_round_trip_rebuilds_identically() {
    let project = rig_guides::modules::templates::biped("hero");
    let bytes = encode_document_compressed(&project.to_record(), 3).unwrap();
    let restored = Project::from_record(&decode_document(&bytes).unwrap());

    let mut original_scene = MemoryScene::new();
    let mut restored_scene = MemoryScene::new();
    project.build_proxy(&mut original_scene);
    restored.build_proxy(&mut restored_scene);
    assert_eq!(original_scene.outline(), restored_scene.outline());
}

#[test]
fn test_refresh_pulls_artist_edits() {
    let mut module = Module::generic("torso");
    module.add_proxy(Proxy::new("chest"));
    let mut project = project_of([module]);

    let mut scene = MemoryScene::new();
    let report = project.build_proxy(&mut scene);
    let chest = report.results[0].handle;
    scene
        .move_object(chest, Transform::from_position([0.0, 140.0, 2.0]))
        .unwrap();
    scene.set_field(chest, "breathe", Value::Float(0.3)).unwrap();

    project.refresh_from_live_scene(&scene);
    let chest = &project.modules()[0].proxies()[0];
    assert_eq!(chest.transform().position, [0.0, 140.0, 2.0]);
    assert_eq!(chest.attributes()["breathe"], Value::Float(0.3));
}

// =============================================================================
// Round-trip property
// =============================================================================

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

fn vec3() -> impl Strategy<Value = [f64; 3]> {
    [finite(), finite(), finite()]
}

fn attribute() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        finite().prop_map(Value::Float),
        "[a-z ]{0,12}".prop_map(Value::Text),
        vec3().prop_map(Value::from),
    ]
}

prop_compose! {
    fn arb_proxy()(
        name in "[a-z][a-z0-9_]{0,15}",
        position in vec3(),
        rotation in vec3(),
        offset in proptest::option::of(vec3()),
        scale in 0.01..100.0f64,
        with_parent in any::<bool>(),
        with_meta_parent in any::<bool>(),
        role in proptest::option::of("[a-z]{1,8}"),
        attributes in proptest::collection::vec(("[a-z]{1,6}", attribute()), 0..4),
    ) -> Proxy {
        let mut proxy = Proxy::new(&name).with_locator_scale(scale);
        proxy.set_position(position);
        proxy.set_rotation(rotation);
        if let Some(offset) = offset {
            proxy.set_offset_position(offset);
        }
        if with_parent {
            proxy.set_parent_identifier_from(&Proxy::new("parent"));
        }
        if with_meta_parent {
            proxy.add_meta_parent_from(&Proxy::new("meta"));
        }
        if let Some(role) = role {
            proxy.set_role(&role);
        }
        for (key, value) in attributes {
            proxy.set_attribute(&key, value);
        }
        proxy
    }
}

proptest! {
    #[test]
    fn proxy_record_round_trip(proxy in arb_proxy()) {
        let record = proxy.to_record(true);
        let restored = Proxy::from_record(&record);
        prop_assert_eq!(restored.to_record(true), record);
    }

    #[test]
    fn sparse_patch_touches_only_given_keys(proxy in arb_proxy(), scale in 0.01..100.0f64) {
        let mut patched = proxy.clone();
        let mut record = Record::new();
        record.insert("locatorScale".to_string(), Value::Float(scale));
        patched.patch_from_record(&record);

        prop_assert_eq!(patched.locator_scale(), scale);
        prop_assert_eq!(patched.name(), proxy.name());
        prop_assert_eq!(patched.transform(), proxy.transform());
        prop_assert_eq!(patched.identifier(), proxy.identifier());
        prop_assert_eq!(patched.attributes(), proxy.attributes());
    }
}
