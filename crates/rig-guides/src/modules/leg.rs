//! The leg module: hip to toe, plus a knee pole helper.

use crate::build::BuildContext;
use crate::error::SceneError;
use crate::model::{Module, Proxy};
use crate::modules::arm::POLE_SHAPE;
use crate::modules::{aim_helper, limit_rotation, lock_channels};
use crate::scene::ShapeDescriptor;

pub const TYPE_NAME: &str = "Leg";

pub fn new() -> Module {
    let hip = Proxy::new("hip")
        .with_role("hip")
        .with_initial_position([10.0, 95.0, 0.0]);
    let knee = Proxy::new("knee")
        .with_role("knee")
        .with_initial_position([10.0, 52.0, 3.0])
        .with_parent(&hip);
    let ankle = Proxy::new("ankle")
        .with_role("ankle")
        .with_initial_position([10.0, 8.0, 0.0])
        .with_parent(&knee);
    let ball = Proxy::new("ball")
        .with_role("ball")
        .with_initial_position([10.0, 0.0, 12.0])
        .with_parent(&ankle);
    let toe = Proxy::new("toe")
        .with_role("toe")
        .with_initial_position([10.0, 0.0, 20.0])
        .with_parent(&ball)
        .with_locator_scale(0.5);
    let pole = Proxy::new("knee_pole")
        .with_role("kneePole")
        .with_shape(ShapeDescriptor::new(POLE_SHAPE, "knee_pole"))
        .with_initial_position([10.0, 52.0, 40.0])
        .with_parent(&hip)
        .with_meta_parent(&knee)
        .with_locator_scale(0.5);

    let mut module = Module::new(TYPE_NAME, "leg").with_post_build_hook(post_build);
    module.add_proxies([hip, knee, ankle, ball, toe, pole]);
    module
}

fn post_build(module: &Module, ctx: &mut BuildContext<'_>) -> Result<(), SceneError> {
    lock_channels(module, ctx, "kneePole", &["Rotate", "Scale"])?;
    limit_rotation(module, ctx, "knee", 'x', -5.0, 150.0)?;
    aim_helper(module, ctx, "ankle", "ball")
}
