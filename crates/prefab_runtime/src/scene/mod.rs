//! Scene module
//!
//! Render node types and the in-memory scene used to host spawned prefabs.

pub mod render_node;
pub mod geometry_world;
pub mod scene_manager;

pub use render_node::{RenderNodeKind, RenderFlags, DecalProjection, DecalProperties};
pub use geometry_world::{GeometryWorld, RenderNode, StaticGeometry, GeometryStats, INLINE_MESH_VERSION};
pub use scene_manager::{SceneManager, SceneStats};
