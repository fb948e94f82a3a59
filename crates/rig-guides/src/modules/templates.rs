//! Ready-made projects assembled from the built-in modules.

use crate::model::transform::mirror_x;
use crate::model::{Module, Project, Proxy};
use crate::modules::{arm, head, leg, root, spine};

/// A biped: root, spine, head and mirrored arms and legs.
///
/// Left limbs carry the `l` prefix and sit on +X; right limbs are mirrored
/// onto -X with the `r` prefix. Limbs attach to the spine through module
/// parents, so the whole project forms one hierarchy once built.
pub fn biped(name: &str) -> Project {
    let root = root::new();
    let mut spine = spine::new();
    let mut head = head::new();

    attach(&mut spine, &root, "root");
    attach(&mut head, &spine, "chest");

    let mut left_arm = arm::new().with_prefix("l");
    let mut right_arm = mirrored(arm::new()).with_prefix("r");
    let mut left_leg = leg::new().with_prefix("l");
    let mut right_leg = mirrored(leg::new()).with_prefix("r");
    for (limb, module_name, side, anchor) in [
        (&mut left_arm, "arm_l", "left", "chest"),
        (&mut right_arm, "arm_r", "right", "chest"),
        (&mut left_leg, "leg_l", "left", "pelvis"),
        (&mut right_leg, "leg_r", "right", "pelvis"),
    ] {
        limb.set_name(module_name);
        limb.set_metadata("side", side);
        attach(limb, &spine, anchor);
    }

    let mut project = Project::new(name);
    project.add_modules([root, spine, head, left_arm, right_arm, left_leg, right_leg]);
    project
}

/// Parents `module` to the proxy of `target` tagged `role`.
fn attach(module: &mut Module, target: &Module, role: &str) {
    if let Some(proxy) = target.proxy_by_role(role) {
        module.set_parent_identifier_from(proxy);
    }
}

/// Reflects every proxy of the module across the YZ plane.
fn mirrored(mut module: Module) -> Module {
    for proxy in module.proxies_mut() {
        mirror_proxy(proxy);
    }
    module
}

fn mirror_proxy(proxy: &mut Proxy) {
    proxy.set_position(mirror_x(proxy.transform().position));
    if let Some(offset) = proxy.offset_transform().copied() {
        proxy.set_offset_position(mirror_x(offset.position));
    }
}
