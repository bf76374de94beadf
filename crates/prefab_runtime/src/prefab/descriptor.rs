//! Descriptors stored in a prefab template
//!
//! Every descriptor carries its transform relative to the template origin.
//! Spawned objects are kept in the same order as these descriptors.

use crate::assets::DataNode;
use crate::ecs::EntityId;
use crate::foundation::collections::TemplateId;
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{DecalProjection, RenderFlags};
use std::cell::OnceCell;

/// A game entity to create
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    /// Entity class
    pub class: String,
    /// Entity name
    pub name: String,
    /// Id stored in the library; never reused when spawning
    pub stored_id: Option<EntityId>,
    /// Transform relative to the template origin
    pub local: Mat4,
    /// Scale decomposed from `local`
    pub scale: Vec3,
    /// Initialization payload
    pub properties: Option<DataNode>,
}

/// Inline mesh payload of a designer object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMesh {
    /// Payload format version
    pub version: u32,
    /// Raw payload
    pub bytes: Vec<u8>,
}

/// Decal specific parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DecalDescriptor {
    /// Projection kind
    pub projection: DecalProjection,
    /// Draw order among overlapping decals
    pub sort_priority: u8,
    /// Projection depth
    pub depth: f32,
    /// Rendered in the deferred pass
    pub deferred: bool,
}

impl Default for DecalDescriptor {
    fn default() -> Self {
        Self {
            projection: DecalProjection::Planar,
            sort_priority: 16,
            depth: 1.0,
            deferred: false,
        }
    }
}

/// What a geometry descriptor creates
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryKind {
    /// Static geometry from a file or an inline payload
    Brush {
        /// Static geometry file
        file: Option<String>,
        /// Payload used when no file is given
        inline_mesh: Option<InlineMesh>,
    },
    /// Projected decal
    Decal(DecalDescriptor),
}

/// Static geometry or decal placement
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDescriptor {
    /// Object name
    pub name: String,
    /// Transform relative to the template origin
    pub local: Mat4,
    /// Render flags
    pub render_flags: RenderFlags,
    /// LOD ratio
    pub lod_ratio: i32,
    /// View distance multiplier
    pub view_distance_multiplier: f32,
    /// Material override
    pub material: Option<String>,
    /// Brush or decal
    pub kind: GeometryKind,
}

impl GeometryDescriptor {
    /// True for decals
    pub fn is_decal(&self) -> bool {
        matches!(self.kind, GeometryKind::Decal(_))
    }
}

/// Reference to another template, resolved lazily
#[derive(Debug, Clone, PartialEq)]
pub struct NestedPrefabReference {
    /// Qualified name of the referenced template
    pub name: String,
    /// Transform relative to the template origin
    pub local: Mat4,
    target: OnceCell<TemplateId>,
}

impl NestedPrefabReference {
    /// Create an unresolved reference
    pub fn new(name: impl Into<String>, local: Mat4) -> Self {
        Self {
            name: name.into(),
            local,
            target: OnceCell::new(),
        }
    }

    /// Resolved template, if any
    pub fn target(&self) -> Option<TemplateId> {
        self.target.get().copied()
    }

    /// True once a template has been bound
    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// Bind the referenced template. The first binding wins.
    pub fn resolve(&self, id: TemplateId) -> bool {
        self.target.set(id).is_ok()
    }
}
