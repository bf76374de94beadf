//! Parsed prefab templates
//!
//! A template is built once from a `Prefab` node of a library tree and is
//! read-only afterwards. Object nodes are classified by their `Type`
//! attribute; anything unrecognized or missing required fields is skipped.

use super::descriptor::{
    DecalDescriptor, EntityDescriptor, GeometryDescriptor, GeometryKind, InlineMesh,
    NestedPrefabReference,
};
use crate::assets::DataNode;
use crate::ecs::EntityId;
use crate::foundation::collections::TemplateId;
use crate::foundation::math::{axis_scale, Mat4, Quat, Transform, Vec3};
use crate::scene::{DecalProjection, RenderFlags, INLINE_MESH_VERSION};

/// Kinds of object nodes found in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// Game entity
    Entity,
    /// Static geometry from a file
    Brush,
    /// Projected decal
    Decal,
    /// Reference to another template
    Prefab,
    /// Static geometry with an inline mesh payload
    Designer,
}

impl ObjectType {
    /// Classify an object node by its type tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Entity" => Some(Self::Entity),
            "Brush" => Some(Self::Brush),
            "Decal" => Some(Self::Decal),
            "Prefab" => Some(Self::Prefab),
            "Designer" => Some(Self::Designer),
            _ => None,
        }
    }
}

/// Immutable description of what a prefab spawns
#[derive(Debug, Clone, Default)]
pub struct PrefabTemplate {
    id: TemplateId,
    name: String,
    library: String,
    entities: Vec<EntityDescriptor>,
    geometry: Vec<GeometryDescriptor>,
    nested: Vec<NestedPrefabReference>,
}

impl PrefabTemplate {
    /// Create an empty template
    pub fn new(name: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            library: library.into(),
            ..Default::default()
        }
    }

    /// Build a template from a `Prefab` node.
    ///
    /// Objects are read from the `Objects` child, or from the node itself
    /// when that child is absent.
    pub fn load(name: impl Into<String>, library: impl Into<String>, node: &DataNode) -> Self {
        let mut template = Self::new(name, library);
        let objects = node.child("Objects").unwrap_or(node);

        for object in &objects.children {
            let Some(object_type) = object.attr("Type").and_then(ObjectType::from_tag) else {
                log::debug!(
                    "Prefab '{}': skipping <{}> with type {:?}",
                    template.name,
                    object.tag,
                    object.attr("Type")
                );
                continue;
            };
            template.load_object(object_type, object);
        }

        log::trace!(
            "Loaded prefab '{}': {} entities, {} geometry, {} nested",
            template.name,
            template.entities.len(),
            template.geometry.len(),
            template.nested.len()
        );
        template
    }

    fn load_object(&mut self, object_type: ObjectType, object: &DataNode) {
        let local = local_transform(object);
        match object_type {
            ObjectType::Entity => {
                let Some(class) = object.attr("EntityClass").filter(|c| !c.is_empty()) else {
                    log::debug!("Prefab '{}': entity without class skipped", self.name);
                    return;
                };
                self.entities.push(EntityDescriptor {
                    class: class.to_string(),
                    name: object.attr("Name").unwrap_or_default().to_string(),
                    stored_id: object.attr_u32("EntityId").map(EntityId::new),
                    scale: axis_scale(&local),
                    local,
                    properties: object.child("Properties").cloned(),
                });
            }
            ObjectType::Brush => {
                let file = object.attr("File").filter(|f| !f.is_empty()).map(str::to_string);
                self.geometry.push(geometry_descriptor(
                    object,
                    local,
                    GeometryKind::Brush { file, inline_mesh: None },
                ));
            }
            ObjectType::Designer => {
                let inline_mesh = object.attr_base64("MeshData").map(|bytes| InlineMesh {
                    version: object.attr_u32("Version").unwrap_or(INLINE_MESH_VERSION),
                    bytes,
                });
                self.geometry.push(geometry_descriptor(
                    object,
                    local,
                    GeometryKind::Brush { file: None, inline_mesh },
                ));
            }
            ObjectType::Decal => {
                let defaults = DecalDescriptor::default();
                let decal = DecalDescriptor {
                    projection: object
                        .attr_i32("ProjectionType")
                        .map_or(defaults.projection, DecalProjection::from_index),
                    sort_priority: object
                        .attr_u32("SortPriority")
                        .map_or(defaults.sort_priority, |p| p.min(u32::from(u8::MAX)) as u8),
                    depth: object.attr_f32("Depth").unwrap_or(defaults.depth),
                    deferred: object.attr_bool("Deferred").unwrap_or(defaults.deferred),
                };
                self.geometry.push(geometry_descriptor(object, local, GeometryKind::Decal(decal)));
            }
            ObjectType::Prefab => {
                let Some(name) = object.attr("PrefabName").filter(|n| !n.is_empty()) else {
                    log::debug!("Prefab '{}': nested prefab without name skipped", self.name);
                    return;
                };
                self.nested.push(NestedPrefabReference::new(name, local));
            }
        }
    }

    pub(crate) fn with_id(mut self, id: TemplateId) -> Self {
        self.id = id;
        self
    }

    /// Builder pattern: append an entity descriptor
    pub fn with_entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push(descriptor);
        self
    }

    /// Builder pattern: append a geometry descriptor
    pub fn with_geometry(mut self, descriptor: GeometryDescriptor) -> Self {
        self.geometry.push(descriptor);
        self
    }

    /// Builder pattern: append a nested prefab reference
    pub fn with_nested(mut self, reference: NestedPrefabReference) -> Self {
        self.nested.push(reference);
        self
    }

    /// Arena handle, null until the template is registered in a catalog
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Name within the owning library, e.g. `Default.Crate`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared name of the owning library
    pub fn library(&self) -> &str {
        &self.library
    }

    /// `Library.Name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.library, self.name)
    }

    /// Entity descriptors in spawn order
    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    /// Geometry descriptors in spawn order
    pub fn geometry(&self) -> &[GeometryDescriptor] {
        &self.geometry
    }

    /// Nested prefab references in spawn order
    pub fn nested(&self) -> &[NestedPrefabReference] {
        &self.nested
    }
}

/// Scale, then rotation, then translation
fn local_transform(object: &DataNode) -> Mat4 {
    Transform::new(
        object.attr_vec3("Pos").unwrap_or_else(Vec3::zeros),
        object.attr_quat("Rotate").unwrap_or_else(Quat::identity),
        object.attr_vec3("Scale").unwrap_or_else(|| Vec3::new(1.0, 1.0, 1.0)),
    )
    .to_matrix()
}

fn geometry_descriptor(object: &DataNode, local: Mat4, kind: GeometryKind) -> GeometryDescriptor {
    GeometryDescriptor {
        name: object.attr("Name").unwrap_or_default().to_string(),
        local,
        render_flags: RenderFlags::from_bits_retain(object.attr_u32("RndFlags").unwrap_or(0)),
        lod_ratio: object.attr_i32("LodRatio").unwrap_or(100),
        view_distance_multiplier: object.attr_f32("ViewDistRatio").unwrap_or(100.0) / 100.0,
        material: object.attr("Material").filter(|m| !m.is_empty()).map(str::to_string),
        kind,
    }
}
