//! Axis-aligned bounding boxes

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Inverted box that any added point or box replaces
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(f32::MIN),
        }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Cube of the given edge length centered on the origin
    pub fn cube(size: f32) -> Self {
        Self::from_center_extents(Vec3::zeros(), Vec3::repeat(size * 0.5))
    }

    /// True when min > max on any axis
    pub fn is_inverted(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain a point
    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grow the box to contain another box. Inverted boxes are ignored.
    pub fn add_box(&mut self, other: &Aabb) {
        if other.is_inverted() {
            return;
        }
        self.add_point(other.min);
        self.add_point(other.max);
    }

    /// Box enclosing the eight transformed corners
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        if self.is_inverted() {
            return *self;
        }
        let mut result = Aabb::empty();
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            result.add_point(matrix.transform_point(&corner).coords);
        }
        result
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
