//! Project build orchestration.
//!
//! Building runs in seven ordered passes over the whole project: root
//! containers, proxies of every module, side-dressing, identity-based
//! re-parenting, guide connectors, custom attributes and finally module
//! post-build hooks. Parenting is project-wide, so it only starts once
//! every proxy of every module exists in the scene.

mod context;
mod options;
mod orchestrator;
mod report;

pub use context::{BuildContext, BuildIndex};
pub use options::BuildOptions;
pub use orchestrator::SkeletonPass;
pub use report::{BuildPhase, BuildReport, ModuleBuild};
