//! The head module: neck, head and a head-end marker.

use crate::build::BuildContext;
use crate::error::SceneError;
use crate::model::{Module, Proxy};
use crate::modules::lock_channels;

pub const TYPE_NAME: &str = "Head";

pub fn new() -> Module {
    let neck = Proxy::new("neck")
        .with_role("neck")
        .with_initial_position([0.0, 150.0, -2.0]);
    let head = Proxy::new("head")
        .with_role("head")
        .with_initial_position([0.0, 160.0, 0.0])
        .with_parent(&neck);
    let head_end = Proxy::new("head_end")
        .with_role("headEnd")
        .with_initial_position([0.0, 180.0, 0.0])
        .with_parent(&head)
        .with_locator_scale(0.5);

    let mut module = Module::new(TYPE_NAME, "head").with_post_build_hook(post_build);
    module.add_proxies([neck, head, head_end]);
    module
}

fn post_build(module: &Module, ctx: &mut BuildContext<'_>) -> Result<(), SceneError> {
    lock_channels(module, ctx, "headEnd", &["Rotate", "Scale"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_defaults() {
        let module = new();
        assert_eq!(module.proxies().len(), 3);
        assert_eq!(module.proxy_by_role("headEnd").unwrap().locator_scale(), 0.5);
    }
}
