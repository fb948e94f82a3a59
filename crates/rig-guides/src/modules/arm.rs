//! The arm module: clavicle to wrist, plus an elbow pole helper.

use crate::build::BuildContext;
use crate::error::SceneError;
use crate::model::{Module, Proxy};
use crate::modules::{aim_helper, limit_rotation, lock_channels};
use crate::scene::ShapeDescriptor;

pub const TYPE_NAME: &str = "Arm";

/// Shape kind of pole-vector helpers.
pub const POLE_SHAPE: &str = "pole";

pub fn new() -> Module {
    let clavicle = Proxy::new("clavicle")
        .with_role("clavicle")
        .with_initial_position([3.0, 145.0, 0.0]);
    let shoulder = Proxy::new("shoulder")
        .with_role("shoulder")
        .with_initial_position([15.0, 145.0, -2.0])
        .with_parent(&clavicle);
    let elbow = Proxy::new("elbow")
        .with_role("elbow")
        .with_initial_position([40.0, 145.0, -5.0])
        .with_parent(&shoulder);
    let wrist = Proxy::new("wrist")
        .with_role("wrist")
        .with_initial_position([65.0, 145.0, 0.0])
        .with_parent(&elbow);
    // Structurally under the shoulder, visually tied to the elbow.
    let pole = Proxy::new("elbow_pole")
        .with_role("elbowPole")
        .with_shape(ShapeDescriptor::new(POLE_SHAPE, "elbow_pole"))
        .with_initial_position([40.0, 145.0, -40.0])
        .with_parent(&shoulder)
        .with_meta_parent(&elbow)
        .with_locator_scale(0.5);

    let mut module = Module::new(TYPE_NAME, "arm").with_post_build_hook(post_build);
    module.add_proxies([clavicle, shoulder, elbow, wrist, pole]);
    module
}

fn post_build(module: &Module, ctx: &mut BuildContext<'_>) -> Result<(), SceneError> {
    lock_channels(module, ctx, "elbowPole", &["Rotate", "Scale"])?;
    limit_rotation(module, ctx, "elbow", 'y', -150.0, 5.0)?;
    aim_helper(module, ctx, "shoulder", "elbow")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_defaults() {
        let module = new();
        assert_eq!(module.type_name(), TYPE_NAME);
        assert_eq!(module.proxies().len(), 5);

        let elbow = module.proxy_by_role("elbow").unwrap();
        let shoulder = module.proxy_by_role("shoulder").unwrap();
        let pole = module.proxy_by_role("elbowPole").unwrap();
        assert_eq!(pole.parent_identifier(), Some(shoulder.identifier()));
        assert_eq!(pole.meta_parent(), Some(elbow.identifier()));
        assert_eq!(pole.connector_target(), Some(elbow.identifier()));
        assert_eq!(pole.shape_descriptor().unwrap().kind, POLE_SHAPE);
    }

    #[test]
    fn test_each_arm_gets_fresh_identity() {
        let a = new();
        let b = new();
        assert_ne!(a.proxies()[0].identifier(), b.proxies()[0].identifier());
    }
}
