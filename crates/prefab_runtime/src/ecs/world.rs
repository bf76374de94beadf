//! In-memory entity world

use super::{EntityId, EntitySpawnParams};
use crate::assets::DataNode;
use crate::foundation::bounds::Aabb;
use crate::foundation::math::{Mat4, Transform};
use crate::world::EntitySystem;
use std::collections::{BTreeMap, HashSet};

/// An entity as stored by [`World`]
#[derive(Debug, Clone)]
pub struct EntityRecord {
    /// Entity class
    pub class: String,
    /// Entity name
    pub name: String,
    /// World matrix
    pub matrix: Mat4,
    /// Hidden flag
    pub hidden: bool,
    /// Removal is refused while set
    pub unremovable: bool,
    /// Bounds in entity space
    pub local_bounds: Aabb,
    /// Initialization payload
    pub properties: Option<DataNode>,
}

/// Counters for leak checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Entities created so far
    pub created: usize,
    /// Entities removed so far
    pub removed: usize,
    /// Entities currently alive
    pub live: usize,
    /// Completed creation batches
    pub batches: usize,
}

/// In-memory [`EntitySystem`] implementation
#[derive(Debug)]
pub struct World {
    next_entity_id: u32,
    entities: BTreeMap<EntityId, EntityRecord>,
    default_bounds: Aabb,
    failing_classes: HashSet<String>,
    batch_depth: usize,
    created: usize,
    removed: usize,
    batches: usize,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self {
            next_entity_id: 1,
            entities: BTreeMap::new(),
            default_bounds: Aabb::cube(1.0),
            failing_classes: HashSet::new(),
            batch_depth: 0,
            created: 0,
            removed: 0,
            batches: 0,
        }
    }

    /// Create an entity of the given class placed at `transform`
    pub fn create_entity(&mut self, class: impl Into<String>, transform: &Transform) -> EntityId {
        let id = self.allocate_id();
        self.entities.insert(
            id,
            EntityRecord {
                class: class.into(),
                name: String::new(),
                matrix: transform.to_matrix(),
                hidden: false,
                unremovable: false,
                local_bounds: self.default_bounds,
                properties: None,
            },
        );
        self.created += 1;
        id
    }

    /// Make every spawn of the given class fail
    pub fn fail_class(&mut self, class: impl Into<String>) {
        self.failing_classes.insert(class.into());
    }

    /// Look up an entity
    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Iterate over all live entity ids
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Current counters
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            created: self.created,
            removed: self.removed,
            live: self.entities.len(),
            batches: self.batches,
        }
    }

    /// True while a creation batch is open
    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    fn allocate_id(&mut self) -> EntityId {
        while self.entities.contains_key(&EntityId::new(self.next_entity_id)) {
            self.next_entity_id += 1;
        }
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitySystem for World {
    fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            log::warn!("end_batch without matching begin_batch");
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.batches += 1;
        }
    }

    fn spawn_entity(&mut self, params: EntitySpawnParams) -> Option<EntityId> {
        if self.failing_classes.contains(&params.class) {
            log::warn!("Spawn of entity class '{}' failed", params.class);
            return None;
        }
        let id = match params.id {
            Some(requested) if !self.entities.contains_key(&requested) => requested,
            Some(requested) => {
                log::warn!("Entity id {} already in use", requested);
                return None;
            }
            None => self.allocate_id(),
        };
        let transform = Transform::new(params.position, params.rotation, params.scale);
        self.entities.insert(
            id,
            EntityRecord {
                class: params.class,
                name: params.name,
                matrix: transform.to_matrix(),
                hidden: false,
                unremovable: params.unremovable,
                local_bounds: self.default_bounds,
                properties: params.properties,
            },
        );
        self.created += 1;
        Some(id)
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn world_matrix(&self, entity: EntityId) -> Option<Mat4> {
        self.entities.get(&entity).map(|e| e.matrix)
    }

    fn set_world_matrix(&mut self, entity: EntityId, matrix: &Mat4) -> bool {
        match self.entities.get_mut(&entity) {
            Some(record) => {
                record.matrix = *matrix;
                true
            }
            None => false,
        }
    }

    fn set_hidden(&mut self, entity: EntityId, hidden: bool) -> bool {
        match self.entities.get_mut(&entity) {
            Some(record) => {
                record.hidden = hidden;
                true
            }
            None => false,
        }
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        match self.entities.get(&entity) {
            Some(record) if record.unremovable => {
                log::warn!("Entity {} is unremovable", entity);
                false
            }
            Some(_) => {
                self.entities.remove(&entity);
                self.removed += 1;
                true
            }
            None => false,
        }
    }

    fn local_bounds(&self, entity: EntityId) -> Option<Aabb> {
        self.entities.get(&entity).map(|e| e.local_bounds)
    }

    fn set_local_bounds(&mut self, entity: EntityId, bounds: Aabb) -> bool {
        match self.entities.get_mut(&entity) {
            Some(record) => {
                record.local_bounds = bounds;
                true
            }
            None => false,
        }
    }

    fn entities_of_class(&self, class: &str) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, record)| record.class == class)
            .map(|(id, _)| *id)
            .collect()
    }
}
