//! Render node kinds, flags and decal parameters

use crate::foundation::collections::MaterialId;
use crate::foundation::math::{Mat3, Vec3};

/// What a render node draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderNodeKind {
    /// Static geometry
    Brush,
    /// Projected decal
    Decal,
}

bitflags::bitflags! {
    /// Per-node render flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u32 {
        /// Node casts shadows
        const CAST_SHADOWS = 1 << 0;
        /// Node is hidden
        const HIDDEN = 1 << 1;
        /// Node receives wind
        const RECEIVE_WIND = 1 << 2;
        /// Node is rendered outdoors only
        const OUTDOOR_ONLY = 1 << 3;
        /// Skip occlusion culling
        const NO_OCCLUSION = 1 << 4;
        /// Node is excluded from physics
        const NO_PHYSICS = 1 << 5;
    }
}

/// How a decal is projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecalProjection {
    /// Flat quad at the decal transform
    #[default]
    Planar,
    /// Projected on terrain
    Terrain,
    /// Projected on terrain and static objects
    TerrainAndStatic,
}

impl DecalProjection {
    /// Map the stored projection index; unknown values are planar
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Terrain,
            2 => Self::TerrainAndStatic,
            _ => Self::Planar,
        }
    }
}

/// Parameters handed to a decal render node
#[derive(Debug, Clone, PartialEq)]
pub struct DecalProperties {
    /// Projection kind
    pub projection: DecalProjection,
    /// World position of the decal
    pub position: Vec3,
    /// Per-axis size taken from the world transform
    pub size: Vec3,
    /// Normalized right/up/front basis, only for non-planar projections
    pub explicit_basis: Option<Mat3>,
    /// Draw order among overlapping decals
    pub sort_priority: u8,
    /// Projection depth
    pub depth: f32,
    /// Rendered in the deferred pass
    pub deferred: bool,
    /// Material override
    pub material: Option<MaterialId>,
}
