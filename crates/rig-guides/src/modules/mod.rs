//! Built-in module types.
//!
//! Each type differs from the generic shell only in its default proxies
//! (pose offsets, role tags) and in its post-build decoration.

pub mod arm;
pub mod head;
pub mod leg;
pub mod registry;
pub mod root;
pub mod spine;
pub mod templates;

pub use registry::{ModuleConstructor, ModuleRegistry};

use crate::build::BuildContext;
use crate::error::SceneError;
use crate::model::{Module, Value};

/// Writes `lock<Channel>` flags on the proxy tagged `role`.
///
/// Missing or unbuilt proxies are skipped.
pub(crate) fn lock_channels(
    module: &Module,
    ctx: &mut BuildContext<'_>,
    role: &str,
    channels: &[&str],
) -> Result<(), SceneError> {
    let Some(handle) = module
        .proxy_by_role(role)
        .and_then(|p| ctx.handle_for(p.identifier()))
    else {
        return Ok(());
    };
    for channel in channels {
        ctx.scene()
            .apply_field(handle, &format!("lock{}", channel), &Value::Bool(true))?;
    }
    Ok(())
}

/// Writes a `[min, max]` rotation limit on the proxy tagged `role`.
pub(crate) fn limit_rotation(
    module: &Module,
    ctx: &mut BuildContext<'_>,
    role: &str,
    axis: char,
    min: f64,
    max: f64,
) -> Result<(), SceneError> {
    let Some(handle) = module
        .proxy_by_role(role)
        .and_then(|p| ctx.handle_for(p.identifier()))
    else {
        return Ok(());
    };
    let limit = Value::List(vec![Value::Float(min), Value::Float(max)]);
    ctx.scene()
        .apply_field(handle, &format!("limitRotate{}", axis.to_ascii_uppercase()), &limit)
}

/// Records on the `from` proxy which proxy it aims at, and draws a helper
/// line between them.
pub(crate) fn aim_helper(
    module: &Module,
    ctx: &mut BuildContext<'_>,
    from: &str,
    to: &str,
) -> Result<(), SceneError> {
    let (Some(source), Some(target)) = (module.proxy_by_role(from), module.proxy_by_role(to))
    else {
        return Ok(());
    };
    let (Some(source_handle), Some(target_handle)) = (
        ctx.handle_for(source.identifier()),
        ctx.handle_for(target.identifier()),
    ) else {
        return Ok(());
    };
    ctx.scene().apply_field(
        source_handle,
        "aimTarget",
        &Value::Text(target.identifier().to_string()),
    )?;
    ctx.scene().draw_connector(source_handle, target_handle)?;
    Ok(())
}
