//! What a build produced.

use crate::model::{BuildResult, Identifier};
use crate::scene::Handle;

/// How far a module got through the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildPhase {
    /// Nothing materialized (the module was skipped).
    Declared,
    ProxiesBuilt,
    Reparented,
    PostProcessed,
}

/// Per-module outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleBuild {
    pub name: String,
    pub type_name: String,
    pub phase: BuildPhase,
    /// Number of proxies that materialized.
    pub built: usize,
}

/// Summary of one `build_proxy` run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub root: Option<Handle>,
    pub setup: Option<Handle>,
    /// Every successful proxy build, across all modules, in build order.
    pub results: Vec<BuildResult>,
    pub modules: Vec<ModuleBuild>,
    /// Number of offset containers moved under their resolved parent.
    pub reparented: usize,
    pub connectors: Vec<Handle>,
    /// Names of skipped units, as `module` or `module/proxy`.
    pub skipped: Vec<String>,
}

impl BuildReport {
    pub fn result_for(&self, identifier: &Identifier) -> Option<&BuildResult> {
        self.results.iter().find(|r| &r.identifier == identifier)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleBuild> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn phase_of(&self, module_name: &str) -> Option<BuildPhase> {
        self.module(module_name).map(|m| m.phase)
    }

    /// True when every declared unit materialized.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
