//! Scene Manager - owns the in-memory collaborators of one world
//!
//! Bundles an entity [`World`], a [`GeometryWorld`] and a
//! [`ScriptRegistry`] so a single value can be handed to the prefab
//! manager through [`SceneManager::context`]. A server world and a preview
//! world are simply two scene managers.

use crate::ecs::{ScriptRegistry, World, WorldStats};
use crate::scene::{GeometryStats, GeometryWorld};
use crate::world::WorldContext;

/// Combined statistics of a scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Entity counters
    pub entities: WorldStats,
    /// Render node and geometry counters
    pub geometry: GeometryStats,
}

/// In-memory scene
#[derive(Debug, Default)]
pub struct SceneManager {
    /// Entity world
    pub world: World,
    /// World geometry
    pub geometry: GeometryWorld,
    /// Script callbacks
    pub scripts: ScriptRegistry,
}

impl SceneManager {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow every collaborator at once
    pub fn context(&mut self) -> WorldContext<'_> {
        WorldContext::new(&mut self.world, &mut self.geometry, &mut self.scripts)
    }

    /// Current statistics
    pub fn stats(&self) -> SceneStats {
        SceneStats {
            entities: self.world.stats(),
            geometry: self.geometry.stats(),
        }
    }
}
