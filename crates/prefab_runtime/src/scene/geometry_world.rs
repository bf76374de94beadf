//! In-memory world geometry
//!
//! Keeps render nodes in a slot map and static geometry in a reference
//! counted cache keyed by file name. Counters make leaks visible in tests.

use crate::foundation::bounds::Aabb;
use crate::foundation::collections::{MaterialId, RenderNodeId, SlotMap, StaticGeometryId};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{DecalProperties, RenderFlags, RenderNodeKind};
use crate::world::WorldGeometry;
use std::collections::{HashMap, HashSet};

/// Inline mesh payload version understood by [`GeometryWorld`]
pub const INLINE_MESH_VERSION: u32 = 1;

/// A render node as stored by [`GeometryWorld`]
#[derive(Debug, Clone)]
pub struct RenderNode {
    /// Brush or decal
    pub kind: RenderNodeKind,
    /// World matrix
    pub matrix: Mat4,
    /// Render flags
    pub flags: RenderFlags,
    /// LOD ratio
    pub lod_ratio: i32,
    /// View distance multiplier
    pub view_distance_multiplier: f32,
    /// Material override
    pub material: Option<MaterialId>,
    /// Attached static geometry
    pub static_geometry: Option<StaticGeometryId>,
    /// Decal projection, decal nodes only
    pub decal: Option<DecalProperties>,
    /// Hidden flag
    pub hidden: bool,
    /// Registered in the world
    pub registered: bool,
}

impl RenderNode {
    fn new(kind: RenderNodeKind) -> Self {
        Self {
            kind,
            matrix: Mat4::identity(),
            flags: RenderFlags::empty(),
            lod_ratio: 100,
            view_distance_multiplier: 1.0,
            material: None,
            static_geometry: None,
            decal: None,
            hidden: false,
            registered: false,
        }
    }
}

/// Loaded static geometry
#[derive(Debug, Clone)]
pub struct StaticGeometry {
    /// Source file, `None` for decoded inline meshes
    pub file_name: Option<String>,
    /// Bounds in the geometry's own space
    pub bounds: Aabb,
    /// Outstanding references
    pub ref_count: u32,
}

/// Statistics for leak checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryStats {
    /// Nodes created so far
    pub nodes_created: usize,
    /// Nodes deleted so far
    pub nodes_deleted: usize,
    /// Register calls so far
    pub registrations: usize,
    /// Nodes currently alive
    pub live_nodes: usize,
    /// Nodes currently registered
    pub registered_nodes: usize,
    /// Static geometry currently loaded
    pub live_static_geometry: usize,
}

/// In-memory [`WorldGeometry`] implementation
#[derive(Debug, Default)]
pub struct GeometryWorld {
    nodes: SlotMap<RenderNodeId, RenderNode>,
    static_geometry: SlotMap<StaticGeometryId, StaticGeometry>,
    geometry_by_file: HashMap<String, StaticGeometryId>,
    known_assets: HashMap<String, Aabb>,
    materials: SlotMap<MaterialId, String>,
    material_by_name: HashMap<String, MaterialId>,
    failing_kinds: HashSet<RenderNodeKind>,
    nodes_created: usize,
    nodes_deleted: usize,
    registrations: usize,
}

impl GeometryWorld {
    /// Create an empty geometry world
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a static geometry file loadable with the given bounds
    pub fn add_asset(&mut self, file_name: impl Into<String>, bounds: Aabb) {
        self.known_assets.insert(file_name.into(), bounds);
    }

    /// Make every creation of the given node kind fail
    pub fn fail_node_kind(&mut self, kind: RenderNodeKind) {
        self.failing_kinds.insert(kind);
    }

    /// Look up a node
    pub fn node(&self, node: RenderNodeId) -> Option<&RenderNode> {
        self.nodes.get(node)
    }

    /// True if the node is still alive
    pub fn contains(&self, node: RenderNodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Look up static geometry
    pub fn geometry(&self, geometry: StaticGeometryId) -> Option<&StaticGeometry> {
        self.static_geometry.get(geometry)
    }

    /// Name a material was loaded under
    pub fn material_name(&self, material: MaterialId) -> Option<&str> {
        self.materials.get(material).map(String::as_str)
    }

    /// Current statistics
    pub fn stats(&self) -> GeometryStats {
        GeometryStats {
            nodes_created: self.nodes_created,
            nodes_deleted: self.nodes_deleted,
            registrations: self.registrations,
            live_nodes: self.nodes.len(),
            registered_nodes: self.nodes.values().filter(|n| n.registered).count(),
            live_static_geometry: self.static_geometry.len(),
        }
    }

    fn insert_geometry(&mut self, file_name: Option<String>, bounds: Aabb) -> StaticGeometryId {
        self.static_geometry.insert(StaticGeometry {
            file_name,
            bounds,
            ref_count: 1,
        })
    }
}

impl WorldGeometry for GeometryWorld {
    fn create_render_node(&mut self, kind: RenderNodeKind) -> Option<RenderNodeId> {
        if self.failing_kinds.contains(&kind) {
            log::warn!("Render node creation of kind {:?} failed", kind);
            return None;
        }
        self.nodes_created += 1;
        Some(self.nodes.insert(RenderNode::new(kind)))
    }

    fn delete_render_node(&mut self, node: RenderNodeId) {
        if self.nodes.remove(node).is_some() {
            self.nodes_deleted += 1;
        }
    }

    fn set_matrix(&mut self, node: RenderNodeId, matrix: &Mat4) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.matrix = *matrix;
        }
    }

    fn set_render_flags(&mut self, node: RenderNodeId, flags: RenderFlags) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.flags = flags;
            n.hidden = flags.contains(RenderFlags::HIDDEN);
        }
    }

    fn set_lod_ratio(&mut self, node: RenderNodeId, ratio: i32) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.lod_ratio = ratio;
        }
    }

    fn set_view_distance_multiplier(&mut self, node: RenderNodeId, multiplier: f32) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.view_distance_multiplier = multiplier;
        }
    }

    fn set_material(&mut self, node: RenderNodeId, material: Option<MaterialId>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.material = material;
        }
    }

    // no render state derived from the geometry to rebuild
    fn set_static_geometry(&mut self, node: RenderNodeId, geometry: Option<StaticGeometryId>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.static_geometry = geometry;
        }
    }

    fn static_geometry(&self, node: RenderNodeId) -> Option<StaticGeometryId> {
        self.nodes.get(node).and_then(|n| n.static_geometry)
    }

    fn release_static_geometry(&mut self, geometry: StaticGeometryId) {
        let Some(entry) = self.static_geometry.get_mut(geometry) else {
            return;
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            if let Some(removed) = self.static_geometry.remove(geometry) {
                if let Some(file_name) = removed.file_name {
                    self.geometry_by_file.remove(&file_name);
                }
            }
        }
    }

    fn set_decal_properties(&mut self, node: RenderNodeId, properties: &DecalProperties) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.decal = Some(properties.clone());
        }
    }

    fn set_hidden(&mut self, node: RenderNodeId, hidden: bool) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.hidden = hidden;
            n.flags.set(RenderFlags::HIDDEN, hidden);
        }
    }

    fn is_registered(&self, node: RenderNodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.registered)
    }

    fn register(&mut self, node: RenderNodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            if n.registered {
                log::warn!("Render node {:?} registered twice", node);
            }
            n.registered = true;
            self.registrations += 1;
        }
    }

    fn unregister(&mut self, node: RenderNodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.registered = false;
        }
    }

    fn load_static_geometry(&mut self, file_name: &str) -> Option<StaticGeometryId> {
        if let Some(&id) = self.geometry_by_file.get(file_name) {
            if let Some(entry) = self.static_geometry.get_mut(id) {
                entry.ref_count += 1;
                return Some(id);
            }
        }
        let Some(bounds) = self.known_assets.get(file_name).copied() else {
            log::warn!("Static geometry '{}' not found", file_name);
            return None;
        };
        let id = self.insert_geometry(Some(file_name.to_string()), bounds);
        self.geometry_by_file.insert(file_name.to_string(), id);
        Some(id)
    }

    fn decode_inline_mesh(&mut self, version: u32, bytes: &[u8]) -> Option<StaticGeometryId> {
        if version != INLINE_MESH_VERSION {
            log::warn!("Unsupported inline mesh version {}", version);
            return None;
        }
        if bytes.is_empty() || bytes.len() % 12 != 0 {
            log::warn!("Inline mesh payload of {} bytes is not a list of positions", bytes.len());
            return None;
        }
        let mut bounds = Aabb::empty();
        for chunk in bytes.chunks_exact(12) {
            let [x, y, z]: [f32; 3] = bytemuck::pod_read_unaligned(chunk);
            bounds.add_point(Vec3::new(x, y, z));
        }
        Some(self.insert_geometry(None, bounds))
    }

    fn static_geometry_bounds(&self, geometry: StaticGeometryId) -> Option<Aabb> {
        self.static_geometry.get(geometry).map(|g| g.bounds)
    }

    fn load_material(&mut self, name: &str) -> Option<MaterialId> {
        if name.is_empty() {
            return None;
        }
        if let Some(&id) = self.material_by_name.get(name) {
            return Some(id);
        }
        let id = self.materials.insert(name.to_string());
        self.material_by_name.insert(name.to_string(), id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_geometry_is_cached_and_ref_counted() {
        let mut world = GeometryWorld::new();
        world.add_asset("objects/crate.cgf", Aabb::cube(1.0));

        let a = world.load_static_geometry("objects/crate.cgf").expect("load");
        let b = world.load_static_geometry("objects/crate.cgf").expect("load");
        assert_eq!(a, b);
        assert_eq!(world.geometry(a).map(|g| g.ref_count), Some(2));

        world.release_static_geometry(a);
        assert_eq!(world.stats().live_static_geometry, 1);
        world.release_static_geometry(b);
        assert_eq!(world.stats().live_static_geometry, 0);
    }

    #[test]
    fn test_unknown_asset_fails() {
        let mut world = GeometryWorld::new();
        assert!(world.load_static_geometry("missing.cgf").is_none());
    }

    #[test]
    fn test_decode_inline_mesh_bounds() {
        let mut world = GeometryWorld::new();
        let positions: [f32; 6] = [-1.0, 0.0, 2.0, 3.0, 4.0, -2.0];
        let bytes: Vec<u8> = positions.iter().flat_map(|v| v.to_ne_bytes()).collect();

        let id = world.decode_inline_mesh(INLINE_MESH_VERSION, &bytes).expect("decode");
        let bounds = world.static_geometry_bounds(id).expect("bounds");
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 4.0, 2.0));

        assert!(world.decode_inline_mesh(INLINE_MESH_VERSION + 1, &bytes).is_none());
        assert!(world.decode_inline_mesh(INLINE_MESH_VERSION, &bytes[..5]).is_none());
    }

    #[test]
    fn test_node_lifecycle_counters() {
        let mut world = GeometryWorld::new();
        let node = world.create_render_node(RenderNodeKind::Brush).expect("node");
        world.register(node);
        assert!(world.is_registered(node));
        assert_eq!(world.stats().registered_nodes, 1);

        world.delete_render_node(node);
        let stats = world.stats();
        assert_eq!(stats.nodes_created, 1);
        assert_eq!(stats.nodes_deleted, 1);
        assert_eq!(stats.live_nodes, 0);
        assert!(!world.contains(node));
    }

    #[test]
    fn test_failing_kind() {
        let mut world = GeometryWorld::new();
        world.fail_node_kind(RenderNodeKind::Decal);
        assert!(world.create_render_node(RenderNodeKind::Decal).is_none());
        assert!(world.create_render_node(RenderNodeKind::Brush).is_some());
    }
}
