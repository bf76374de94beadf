//! Prefabs
//!
//! Templates are parsed once from library trees and shared read-only.
//! Spawning a template for an owner entity creates a [`RuntimePrefab`]
//! that owns the spawned entities, render nodes and nested instances.
//!
//! ```text
//! PrefabManager ── PrefabCatalog ── PrefabLibrary ── PrefabTemplate
//!       │
//!       └── RuntimePrefab (per owner) ── RuntimePrefab (per nested reference)
//! ```

pub mod descriptor;
pub mod template;
pub mod library;
pub mod catalog;
pub mod runtime;
pub mod manager;
pub mod error;

#[cfg(test)]
mod tests;

pub use descriptor::{
    DecalDescriptor, EntityDescriptor, GeometryDescriptor, GeometryKind, InlineMesh,
    NestedPrefabReference,
};
pub use template::{ObjectType, PrefabTemplate};
pub use library::{candidate_names, PrefabLibrary, DEFAULT_GROUP};
pub use catalog::{PrefabCatalog, PrefabResolver, LIBRARY_TAG, PREFAB_TAG};
pub use runtime::{RuntimePrefab, RuntimePrefabStats};
pub use manager::PrefabManager;
pub use error::{PrefabError, SpawnOutcome};
