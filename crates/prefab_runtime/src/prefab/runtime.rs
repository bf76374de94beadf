//! Live prefab instances
//!
//! A [`RuntimePrefab`] owns everything spawned from one template: entity
//! ids, render nodes and one child instance per nested reference. The three
//! lists are ordered like the template's descriptor lists and keep a slot
//! for every descriptor, `None` where creation failed, so moving can
//! reapply each descriptor's local transform by position.
//!
//! Spawning allocates once. Moving only rewrites matrices, starting from
//! the owner entity's current world matrix.

use super::catalog::PrefabResolver;
use super::descriptor::{DecalDescriptor, GeometryDescriptor, GeometryKind};
use super::error::PrefabError;
use super::template::PrefabTemplate;
use crate::ecs::{EntityId, EntitySpawnParams};
use crate::foundation::bounds::Aabb;
use crate::foundation::collections::{MaterialId, RenderNodeId};
use crate::foundation::math::{axis_scale, orthonormalize, rotation, translation, Mat3, Mat4};
use crate::scene::{DecalProjection, DecalProperties, RenderNodeKind};
use crate::world::WorldContext;
use std::rc::Rc;

/// Transitive object counts of an instance tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimePrefabStats {
    /// Live entities
    pub entities: usize,
    /// Live render nodes
    pub geometry: usize,
    /// Descendant instances
    pub instances: usize,
    /// Slots whose creation failed
    pub failed: usize,
}

/// Limits read from the configuration once per spawn
#[derive(Debug, Clone, Copy)]
struct SpawnLimits {
    fallback_bounds_size: f32,
    max_nesting_depth: usize,
}

/// Live instantiation of a [`PrefabTemplate`]
#[derive(Debug)]
pub struct RuntimePrefab {
    owner: EntityId,
    source: Option<Rc<PrefabTemplate>>,
    seed: i32,
    local_offset: Mat4,
    entities: Vec<Option<EntityId>>,
    geometry: Vec<Option<RenderNodeId>>,
    children: Vec<RuntimePrefab>,
}

impl RuntimePrefab {
    /// Create an empty instance owned by `owner`
    pub fn new(owner: EntityId, seed: i32) -> Self {
        Self {
            owner,
            source: None,
            seed,
            local_offset: Mat4::identity(),
            entities: Vec::new(),
            geometry: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Replace the contents of this instance with a spawn of `template`.
    ///
    /// Nested prefabs are spawned before this template's own objects. The
    /// combined bounds, in owner space, are published on the owner entity
    /// and returned. Creation failures of single objects leave `None` slots
    /// and do not fail the spawn.
    pub fn spawn(
        &mut self,
        template: &Rc<PrefabTemplate>,
        resolver: &mut dyn PrefabResolver,
        world: &mut WorldContext<'_>,
    ) -> Result<Aabb, PrefabError> {
        self.clear(world);

        if !world.entities.contains(self.owner) {
            log::error!(
                "Cannot spawn prefab '{}': owner entity {} does not exist",
                template.qualified_name(),
                self.owner
            );
            return Err(PrefabError::OwnerNotFound(self.owner));
        }

        let config = resolver.config();
        let limits = SpawnLimits {
            fallback_bounds_size: config.fallback_bounds_size,
            max_nesting_depth: config.max_nesting_depth,
        };

        let mut bounds = Aabb::empty();
        let mut chain = vec![Rc::clone(template)];
        self.spawn_tree(template, &Mat4::identity(), resolver, world, &mut chain, &mut bounds, limits);

        if bounds.is_inverted() {
            bounds = Aabb::cube(limits.fallback_bounds_size);
        }
        world.entities.set_local_bounds(self.owner, bounds);
        self.move_to_owner(world)?;

        log::debug!(
            "Spawned prefab '{}' for entity {}: {:?}",
            template.qualified_name(),
            self.owner,
            self.stats()
        );
        Ok(bounds)
    }

    fn spawn_tree(
        &mut self,
        template: &Rc<PrefabTemplate>,
        offset: &Mat4,
        resolver: &mut dyn PrefabResolver,
        world: &mut WorldContext<'_>,
        chain: &mut Vec<Rc<PrefabTemplate>>,
        bounds: &mut Aabb,
        limits: SpawnLimits,
    ) {
        self.source = Some(Rc::clone(template));
        self.local_offset = *offset;

        for reference in template.nested() {
            let mut child = Self::new(self.owner, self.seed);
            let child_offset = offset * reference.local;
            child.local_offset = child_offset;

            match resolver.resolve_nested(template, reference) {
                Some(target) if chain.iter().any(|t| Rc::ptr_eq(t, &target)) => {
                    log::warn!(
                        "Prefab '{}': nested prefab '{}' forms a cycle, skipped",
                        template.qualified_name(),
                        reference.name
                    );
                }
                Some(_) if chain.len() >= limits.max_nesting_depth => {
                    log::warn!(
                        "Prefab '{}': nesting deeper than {} levels, '{}' skipped",
                        template.qualified_name(),
                        limits.max_nesting_depth,
                        reference.name
                    );
                }
                Some(target) => {
                    chain.push(Rc::clone(&target));
                    child.spawn_tree(&target, &child_offset, resolver, world, chain, bounds, limits);
                    chain.pop();
                }
                None => {
                    log::warn!(
                        "Prefab '{}': nested prefab '{}' not found",
                        template.qualified_name(),
                        reference.name
                    );
                }
            }
            self.children.push(child);
        }

        self.spawn_entities(template, offset, world, bounds);
        self.spawn_brushes(template, offset, world, bounds);
    }

    /// Create one entity per entity descriptor inside a creation batch
    fn spawn_entities(
        &mut self,
        template: &PrefabTemplate,
        offset: &Mat4,
        world: &mut WorldContext<'_>,
        bounds: &mut Aabb,
    ) {
        if template.entities().is_empty() {
            return;
        }
        self.entities.reserve(template.entities().len());

        world.entities.begin_batch();
        for descriptor in template.entities() {
            let matrix = offset * descriptor.local;
            let placement = orthonormalize(&matrix);

            let params = EntitySpawnParams {
                class: descriptor.class.clone(),
                name: descriptor.name.clone(),
                id: None,
                position: translation(&placement),
                rotation: rotation(&placement),
                scale: descriptor.scale,
                unremovable: false,
                properties: descriptor.properties.clone(),
            };

            let spawned = world.entities.spawn_entity(params);
            match spawned {
                Some(entity) => {
                    if let Some(local) = world.entities.local_bounds(entity) {
                        bounds.add_box(&local.transformed(&matrix));
                    }
                }
                None => log::warn!(
                    "Prefab '{}': failed to spawn entity '{}' of class {}",
                    template.qualified_name(),
                    descriptor.name,
                    descriptor.class
                ),
            }
            self.entities.push(spawned);
        }
        world.entities.end_batch();
    }

    /// Create one render node per geometry descriptor
    fn spawn_brushes(
        &mut self,
        template: &PrefabTemplate,
        offset: &Mat4,
        world: &mut WorldContext<'_>,
        bounds: &mut Aabb,
    ) {
        self.geometry.reserve(template.geometry().len());
        for descriptor in template.geometry() {
            let matrix = offset * descriptor.local;
            let node = spawn_geometry(descriptor, &matrix, world, bounds);
            if node.is_none() {
                log::warn!(
                    "Prefab '{}': failed to create render node '{}'",
                    template.qualified_name(),
                    descriptor.name
                );
            }
            self.geometry.push(node);
        }
    }

    /// Place the whole tree relative to the owner's current world matrix
    pub fn move_to_owner(&self, world: &mut WorldContext<'_>) -> Result<(), PrefabError> {
        let Some(owner_matrix) = world.entities.world_matrix(self.owner) else {
            log::error!("Cannot move prefab: owner entity {} does not exist", self.owner);
            return Err(PrefabError::OwnerNotFound(self.owner));
        };
        self.move_tree(&owner_matrix, world);
        Ok(())
    }

    fn move_tree(&self, owner_matrix: &Mat4, world: &mut WorldContext<'_>) {
        self.apply_offset(&(owner_matrix * self.local_offset), world);
        for child in &self.children {
            child.move_tree(owner_matrix, world);
        }
    }

    /// Rewrite the matrix of every object this instance spawned directly
    fn apply_offset(&self, offset: &Mat4, world: &mut WorldContext<'_>) {
        let Some(template) = &self.source else {
            return;
        };

        for (slot, descriptor) in self.entities.iter().zip(template.entities()) {
            if let Some(entity) = *slot {
                let matrix = offset * descriptor.local;
                log::trace!("Entity {} -> {:?}", entity, translation(&matrix));
                world.entities.set_world_matrix(entity, &matrix);
            }
        }

        for (slot, descriptor) in self.geometry.iter().zip(template.geometry()) {
            let Some(node) = *slot else {
                continue;
            };
            let matrix = offset * descriptor.local;
            if world.geometry.is_registered(node) {
                world.geometry.unregister(node);
            }
            world.geometry.set_matrix(node, &matrix);
            match &descriptor.kind {
                GeometryKind::Brush { .. } => {
                    let attached = world.geometry.static_geometry(node);
                    world.geometry.set_static_geometry(node, attached);
                }
                GeometryKind::Decal(decal) => {
                    let material = resolve_material(descriptor, world);
                    world.geometry.set_decal_properties(node, &decal_properties(decal, &matrix, material));
                }
            }
            world.geometry.register(node);
        }
    }

    /// Hide or show the whole tree, children first
    pub fn hide(&self, hidden: bool, world: &mut WorldContext<'_>) {
        for child in &self.children {
            child.hide(hidden, world);
        }
        for entity in self.entities.iter().flatten() {
            world.entities.set_hidden(*entity, hidden);
        }
        for node in self.geometry.iter().flatten() {
            world.geometry.set_hidden(*node, hidden);
        }
    }

    /// Release everything spawned by this instance and its children.
    /// Safe to call on an empty instance.
    pub fn clear(&mut self, world: &mut WorldContext<'_>) {
        for child in &mut self.children {
            child.clear(world);
        }
        self.children.clear();

        for entity in self.entities.drain(..).flatten() {
            if !world.entities.remove_entity(entity) {
                log::debug!("Entity {} was already gone", entity);
            }
        }

        for node in self.geometry.drain(..).flatten() {
            if let Some(geometry) = world.geometry.static_geometry(node) {
                world.geometry.release_static_geometry(geometry);
            }
            world.geometry.delete_render_node(node);
        }

        self.source = None;
        self.local_offset = Mat4::identity();
    }

    /// Entity that triggered the spawn
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Template this instance was spawned from
    pub fn source_prefab(&self) -> Option<&Rc<PrefabTemplate>> {
        self.source.as_ref()
    }

    /// Seed the instance was spawned with
    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Change the seed used by the next spawn
    pub fn set_seed(&mut self, seed: i32) {
        self.seed = seed;
    }

    /// Offset from the owner entity to this instance
    pub fn local_offset(&self) -> &Mat4 {
        &self.local_offset
    }

    /// Spawned entities, one slot per entity descriptor
    pub fn entities(&self) -> &[Option<EntityId>] {
        &self.entities
    }

    /// Spawned render nodes, one slot per geometry descriptor
    pub fn geometry(&self) -> &[Option<RenderNodeId>] {
        &self.geometry
    }

    /// Child instances, one per nested reference
    pub fn children(&self) -> &[RuntimePrefab] {
        &self.children
    }

    /// True if nothing is spawned
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }

    /// Object counts of the whole tree
    pub fn stats(&self) -> RuntimePrefabStats {
        let mut stats = RuntimePrefabStats {
            entities: self.entities.iter().flatten().count(),
            geometry: self.geometry.iter().flatten().count(),
            instances: self.children.len(),
            failed: self.entities.iter().filter(|e| e.is_none()).count()
                + self.geometry.iter().filter(|g| g.is_none()).count(),
        };
        for child in &self.children {
            let child_stats = child.stats();
            stats.entities += child_stats.entities;
            stats.geometry += child_stats.geometry;
            stats.instances += child_stats.instances;
            stats.failed += child_stats.failed;
        }
        stats
    }

    /// Every live entity of the tree, children first
    pub fn all_entities(&self) -> Vec<EntityId> {
        let mut result: Vec<EntityId> = self.children.iter().flat_map(Self::all_entities).collect();
        result.extend(self.entities.iter().flatten());
        result
    }

    /// Every live render node of the tree, children first
    pub fn all_geometry(&self) -> Vec<RenderNodeId> {
        let mut result: Vec<RenderNodeId> = self.children.iter().flat_map(Self::all_geometry).collect();
        result.extend(self.geometry.iter().flatten());
        result
    }
}

fn resolve_material(descriptor: &GeometryDescriptor, world: &mut WorldContext<'_>) -> Option<MaterialId> {
    let name = descriptor.material.as_deref()?;
    let material = world.geometry.load_material(name);
    if material.is_none() {
        log::warn!("Material '{}' of '{}' not found", name, descriptor.name);
    }
    material
}

/// Create, configure and register one render node
fn spawn_geometry(
    descriptor: &GeometryDescriptor,
    matrix: &Mat4,
    world: &mut WorldContext<'_>,
    bounds: &mut Aabb,
) -> Option<RenderNodeId> {
    let material = resolve_material(descriptor, world);
    let kind = if descriptor.is_decal() {
        RenderNodeKind::Decal
    } else {
        RenderNodeKind::Brush
    };
    let node = world.geometry.create_render_node(kind)?;

    match &descriptor.kind {
        GeometryKind::Decal(decal) => {
            world.geometry.set_decal_properties(node, &decal_properties(decal, matrix, material));
        }
        GeometryKind::Brush { file, inline_mesh } => {
            let static_geometry = match (file, inline_mesh) {
                (Some(file), _) => world.geometry.load_static_geometry(file),
                (None, Some(mesh)) => world.geometry.decode_inline_mesh(mesh.version, &mesh.bytes),
                (None, None) => None,
            };
            if static_geometry.is_none() {
                log::debug!("Brush '{}' spawned without static geometry", descriptor.name);
            }
            world.geometry.set_static_geometry(node, static_geometry);
            if let Some(local) = static_geometry.and_then(|g| world.geometry.static_geometry_bounds(g)) {
                bounds.add_box(&local.transformed(matrix));
            }
        }
    }

    world.geometry.set_material(node, material);
    world.geometry.set_matrix(node, matrix);
    world.geometry.set_render_flags(node, descriptor.render_flags);
    world.geometry.set_lod_ratio(node, descriptor.lod_ratio);
    world
        .geometry
        .set_view_distance_multiplier(node, descriptor.view_distance_multiplier);
    world.geometry.register(node);
    Some(node)
}

/// Projection parameters of a decal placed at `matrix`
fn decal_properties(decal: &DecalDescriptor, matrix: &Mat4, material: Option<MaterialId>) -> DecalProperties {
    let explicit_basis = (decal.projection != DecalProjection::Planar)
        .then(|| -> Mat3 { orthonormalize(matrix).fixed_view::<3, 3>(0, 0).into_owned() });
    DecalProperties {
        projection: decal.projection,
        position: translation(matrix),
        size: axis_scale(matrix),
        explicit_basis,
        sort_priority: decal.sort_priority,
        depth: decal.depth,
        deferred: decal.deferred,
        material,
    }
}
