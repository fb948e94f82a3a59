//! The root module: a single world-space anchor.

use crate::model::{Module, Proxy};
use crate::scene::ShapeDescriptor;

pub const TYPE_NAME: &str = "Root";

pub fn new() -> Module {
    let root = Proxy::new("root")
        .with_role("root")
        .with_shape(ShapeDescriptor::new("circle", "root"))
        .with_locator_scale(4.0);

    let mut module = Module::new(TYPE_NAME, "root");
    module.add_proxy(root);
    module
}
