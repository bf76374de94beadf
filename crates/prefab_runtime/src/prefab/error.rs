//! Prefab errors and spawn outcomes

use crate::assets::SourceError;
use crate::config::ConfigError;
use crate::ecs::EntityId;
use crate::foundation::bounds::Aabb;
use thiserror::Error;

/// Prefab subsystem errors
#[derive(Error, Debug)]
pub enum PrefabError {
    /// The library file could not be read or parsed
    #[error("Failed to load prefab library {path}: {source}")]
    LibrarySource {
        /// Library file path
        path: String,
        /// Source failure
        #[source]
        source: SourceError,
    },

    /// The library root does not declare a name
    #[error("Prefab library {0} has no name")]
    MissingLibraryName(String),

    /// No loaded library matches the name
    #[error("Prefab library not found: {0}")]
    LibraryNotFound(String),

    /// No template matches the name in the library
    #[error("Prefab {name} not found in library {library}")]
    PrefabNotFound {
        /// Library searched
        library: String,
        /// Requested template name
        name: String,
    },

    /// The owner entity is not live
    #[error("Owner entity {0} does not exist")]
    OwnerNotFound(EntityId),

    /// No instance is registered for the owner
    #[error("No prefab instance for entity {0}")]
    InstanceNotFound(EntityId),

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result of a spawn request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnOutcome {
    /// The prefab was spawned with the given local bounds
    Spawned {
        /// Bounds published on the owner entity
        bounds: Aabb,
    },
    /// The template already has its maximum number of live instances
    Throttled,
}

impl SpawnOutcome {
    /// True if the prefab was spawned
    pub fn is_spawned(&self) -> bool {
        matches!(self, Self::Spawned { .. })
    }
}
