//! Entity identifiers and spawn parameters

use crate::assets::DataNode;
use crate::foundation::math::{Quat, Vec3};
use std::fmt;

/// Entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    id: u32,
}

impl EntityId {
    /// Create an entity id from its raw value
    pub const fn new(id: u32) -> Self {
        Self { id }
    }

    /// Get the raw entity id
    pub const fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

/// Everything the entity system needs to create one entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpawnParams {
    /// Entity class name
    pub class: String,
    /// Entity name
    pub name: String,
    /// Requested id; `None` lets the entity system allocate one
    pub id: Option<EntityId>,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// World scale, kept apart from the orthonormal placement
    pub scale: Vec3,
    /// Entity may not be removed while set
    pub unremovable: bool,
    /// Structured initialization payload
    pub properties: Option<DataNode>,
}

impl EntitySpawnParams {
    /// Parameters for an entity of the given class at the origin
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: String::new(),
            id: None,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            unremovable: false,
            properties: None,
        }
    }

    /// Builder pattern: set the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }
}
