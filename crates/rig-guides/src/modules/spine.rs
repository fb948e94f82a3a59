//! The spine module: pelvis up to chest.

use crate::build::BuildContext;
use crate::error::SceneError;
use crate::model::{Module, Proxy};
use crate::modules::lock_channels;

pub const TYPE_NAME: &str = "Spine";

pub fn new() -> Module {
    let pelvis = Proxy::new("pelvis")
        .with_role("pelvis")
        .with_initial_position([0.0, 100.0, 0.0]);
    let spine_01 = Proxy::new("spine_01")
        .with_role("spine01")
        .with_initial_position([0.0, 110.0, -1.0])
        .with_parent(&pelvis);
    let spine_02 = Proxy::new("spine_02")
        .with_role("spine02")
        .with_initial_position([0.0, 121.0, -2.0])
        .with_parent(&spine_01);
    let chest = Proxy::new("chest")
        .with_role("chest")
        .with_initial_position([0.0, 135.0, -1.0])
        .with_parent(&spine_02);

    let mut module = Module::new(TYPE_NAME, "spine").with_post_build_hook(post_build);
    module.add_proxies([pelvis, spine_01, spine_02, chest]);
    module
}

/// Mid-spine guides only slide along the chain, so their translation is
/// driven by the ends.
fn post_build(module: &Module, ctx: &mut BuildContext<'_>) -> Result<(), SceneError> {
    for role in ["spine01", "spine02"] {
        lock_channels(module, ctx, role, &["TranslateX", "Scale"])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spine_chain() {
        let module = new();
        let roles: Vec<&str> = module.proxies().iter().filter_map(|p| p.role()).collect();
        assert_eq!(roles, ["pelvis", "spine01", "spine02", "chest"]);

        let chest = module.proxy_by_role("chest").unwrap();
        let spine_02 = module.proxy_by_role("spine02").unwrap();
        assert_eq!(chest.parent_identifier(), Some(spine_02.identifier()));
        assert!(module.proxy_by_role("pelvis").unwrap().parent_identifier().is_none());
    }
}
