//! State shared with module post-build hooks.

use std::collections::HashMap;

use tracing::warn;

use crate::model::{BuildResult, Identifier};
use crate::scene::{Handle, Scene};

/// Results of the current build, addressed by proxy identifier.
#[derive(Debug, Default)]
pub struct BuildIndex {
    results: HashMap<Identifier, BuildResult>,
}

impl BuildIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a result. A later result for the same identifier wins; the
    /// one it displaced is returned and the collision is logged.
    pub fn insert(&mut self, result: BuildResult) -> Option<BuildResult> {
        let previous = self.results.insert(result.identifier.clone(), result);
        if let Some(previous) = &previous {
            warn!(
                identifier = %previous.identifier,
                displaced = ?previous.handle,
                "identifier built twice, earlier proxy will not be parented"
            );
        }
        previous
    }

    pub fn get(&self, identifier: &Identifier) -> Option<&BuildResult> {
        self.results.get(identifier)
    }

    /// The shape handle built for `identifier`.
    pub fn handle(&self, identifier: &Identifier) -> Option<Handle> {
        self.get(identifier).map(|r| r.handle)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// What a post-build hook sees: the scene plus this build's results.
pub struct BuildContext<'a> {
    scene: &'a mut dyn Scene,
    index: &'a BuildIndex,
    root: Option<Handle>,
    setup: Option<Handle>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        scene: &'a mut dyn Scene,
        index: &'a BuildIndex,
        root: Option<Handle>,
        setup: Option<Handle>,
    ) -> Self {
        BuildContext {
            scene,
            index,
            root,
            setup,
        }
    }

    pub fn scene(&mut self) -> &mut dyn Scene {
        &mut *self.scene
    }

    /// The root container, if the scene managed to create it.
    pub fn root(&self) -> Option<Handle> {
        self.root
    }

    /// The shared container for helper objects.
    pub fn setup(&self) -> Option<Handle> {
        self.setup
    }

    pub fn result_for(&self, identifier: &Identifier) -> Option<&BuildResult> {
        self.index.get(identifier)
    }

    /// Resolves an identifier to a shape handle, first among this build's
    /// results and then among objects already in the scene.
    pub fn handle_for(&self, identifier: &Identifier) -> Option<Handle> {
        self.index
            .handle(identifier)
            .or_else(|| self.scene.find_by_identifier(identifier))
    }
}
