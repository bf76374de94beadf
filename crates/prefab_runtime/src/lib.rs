//! # Prefab Runtime
//!
//! Runtime spawning and lifecycle management for prefabs: named templates
//! of entities, static geometry, decals and nested prefabs that are
//! instantiated into a running world.
//!
//! ## Features
//!
//! - **Template libraries**: parsed once, shared read-only, loaded on demand
//!   across files
//! - **Runtime instances**: recursive spawn with positional bookkeeping so a
//!   whole tree can be moved, hidden or destroyed
//! - **Throttling**: optional per-template cap on live instances
//! - **Level lifecycle**: instances recycled on level load, libraries kept
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prefab_runtime::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scene = SceneManager::new();
//!     let owner = scene.world.create_entity("Spawner", &Transform::identity());
//!
//!     let source = RonLibrarySource::new("assets");
//!     let mut prefabs = PrefabManager::new(source, PrefabConfig::default())?;
//!     prefabs.load_prefab_library("Prefabs/Props.ron")?;
//!     prefabs.spawn_prefab("Props", "Crate", owner, 0, 0, &mut scene.context())?;
//!
//!     prefabs.shutdown(&mut scene.context());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod ecs;
pub mod scene;
pub mod world;
pub mod events;
pub mod assets;
pub mod prefab;

/// Common imports for prefab users
pub mod prelude {
    pub use crate::{
        assets::{DataNode, LibrarySource, MemoryLibrarySource, RonLibrarySource},
        config::{Config, PrefabConfig},
        ecs::{EntityId, World},
        events::{LevelEvent, LevelEventHandler, LevelEventQueue, LevelEventType},
        foundation::{
            bounds::Aabb,
            math::{Mat4, Quat, Transform, Vec3},
        },
        prefab::{PrefabError, PrefabManager, PrefabTemplate, RuntimePrefab, SpawnOutcome},
        scene::{GeometryWorld, SceneManager},
        world::{EntitySystem, ScriptHooks, WorldContext, WorldGeometry},
    };
}
