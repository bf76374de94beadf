//! Collaborator interfaces
//!
//! The prefab runtime never owns entities or render nodes itself. It drives
//! an entity system, a world geometry store and a script layer through the
//! traits below. [`crate::ecs::World`] and [`crate::scene::GeometryWorld`]
//! are in-memory implementations.

use crate::ecs::{EntityId, EntitySpawnParams};
use crate::foundation::bounds::Aabb;
use crate::foundation::collections::{MaterialId, RenderNodeId, StaticGeometryId};
use crate::foundation::math::Mat4;
use crate::scene::{DecalProperties, RenderFlags, RenderNodeKind};

/// Entity system used to create, place and remove game entities
pub trait EntitySystem {
    /// Open a batch of entity creations
    fn begin_batch(&mut self);

    /// Close the batch opened by [`EntitySystem::begin_batch`]
    fn end_batch(&mut self);

    /// Create an entity. Returns `None` when creation failed.
    fn spawn_entity(&mut self, params: EntitySpawnParams) -> Option<EntityId>;

    /// True if the id refers to a live entity
    fn contains(&self, entity: EntityId) -> bool;

    /// Full world matrix of an entity (position, rotation, scale)
    fn world_matrix(&self, entity: EntityId) -> Option<Mat4>;

    /// Place an entity. Returns false if the entity is not live.
    fn set_world_matrix(&mut self, entity: EntityId, matrix: &Mat4) -> bool;

    /// Hide or show an entity. Returns false if the entity is not live.
    fn set_hidden(&mut self, entity: EntityId, hidden: bool) -> bool;

    /// Remove an entity. Returns false if the entity is not live.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Bounds of an entity in its own space
    fn local_bounds(&self, entity: EntityId) -> Option<Aabb>;

    /// Publish bounds for an entity's render proxy
    fn set_local_bounds(&mut self, entity: EntityId, bounds: Aabb) -> bool;

    /// All live entities of a class
    fn entities_of_class(&self, class: &str) -> Vec<EntityId>;
}

/// Static geometry, decals and their render nodes
pub trait WorldGeometry {
    /// Create an unregistered render node
    fn create_render_node(&mut self, kind: RenderNodeKind) -> Option<RenderNodeId>;

    /// Destroy a render node, unregistering it first if needed.
    /// Attached static geometry is not released.
    fn delete_render_node(&mut self, node: RenderNodeId);

    /// Set the world matrix of a render node
    fn set_matrix(&mut self, node: RenderNodeId, matrix: &Mat4);

    /// Set render flags
    fn set_render_flags(&mut self, node: RenderNodeId, flags: RenderFlags);

    /// Set the LOD ratio
    fn set_lod_ratio(&mut self, node: RenderNodeId, ratio: i32);

    /// Set the view distance multiplier
    fn set_view_distance_multiplier(&mut self, node: RenderNodeId, multiplier: f32);

    /// Override the material of a node
    fn set_material(&mut self, node: RenderNodeId, material: Option<MaterialId>);

    /// Attach static geometry to a brush node. Reference counts are untouched.
    ///
    /// Setting the handle a node already holds must rebuild the node's
    /// render state from that geometry; moving a brush relies on it to
    /// refresh geometry derived from the old matrix.
    fn set_static_geometry(&mut self, node: RenderNodeId, geometry: Option<StaticGeometryId>);

    /// Static geometry attached to a brush node
    fn static_geometry(&self, node: RenderNodeId) -> Option<StaticGeometryId>;

    /// Drop one reference to static geometry
    fn release_static_geometry(&mut self, geometry: StaticGeometryId);

    /// Configure the projection of a decal node
    fn set_decal_properties(&mut self, node: RenderNodeId, properties: &DecalProperties);

    /// Hide or show a node
    fn set_hidden(&mut self, node: RenderNodeId, hidden: bool);

    /// True if the node is registered in the world
    fn is_registered(&self, node: RenderNodeId) -> bool;

    /// Register a node in the world at its current matrix
    fn register(&mut self, node: RenderNodeId);

    /// Remove a node from the world without deleting it
    fn unregister(&mut self, node: RenderNodeId);

    /// Load static geometry by file name, adding a reference
    fn load_static_geometry(&mut self, file_name: &str) -> Option<StaticGeometryId>;

    /// Decode an inline mesh payload into new static geometry
    fn decode_inline_mesh(&mut self, version: u32, bytes: &[u8]) -> Option<StaticGeometryId>;

    /// Bounds of static geometry in its own space
    fn static_geometry_bounds(&self, geometry: StaticGeometryId) -> Option<Aabb>;

    /// Load a material by name
    fn load_material(&mut self, name: &str) -> Option<MaterialId>;
}

/// Script layer able to call named callbacks on entities
pub trait ScriptHooks {
    /// Invoke `callback` on the entity with a seed argument.
    /// Returns false if the entity does not expose the callback.
    fn invoke_callback(&mut self, entity: EntityId, callback: &str, seed: i32) -> bool;
}

/// Mutable access to every collaborator a prefab operation may touch
pub struct WorldContext<'a> {
    /// Entity system
    pub entities: &'a mut dyn EntitySystem,
    /// World geometry
    pub geometry: &'a mut dyn WorldGeometry,
    /// Script layer
    pub scripts: &'a mut dyn ScriptHooks,
}

impl<'a> WorldContext<'a> {
    /// Bundle the collaborators
    pub fn new(
        entities: &'a mut dyn EntitySystem,
        geometry: &'a mut dyn WorldGeometry,
        scripts: &'a mut dyn ScriptHooks,
    ) -> Self {
        Self {
            entities,
            geometry,
            scripts,
        }
    }
}
