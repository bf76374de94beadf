//! Math utilities and types
//!
//! Provides the transform types used to place prefab contents in the world.

pub use nalgebra::{
    Vector3,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform from position, rotation and scale
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix.
    ///
    /// Scale is applied first, then rotation, then translation.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Translation part of an affine matrix
pub fn translation(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Per-axis scale factors stored in the basis columns of an affine matrix
pub fn axis_scale(matrix: &Mat4) -> Vec3 {
    Vec3::new(
        Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude(),
        Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude(),
        Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude(),
    )
}

/// Orthonormalize the rotation part of an affine matrix.
///
/// Gram-Schmidt on the basis columns strips any scale or shear picked up by
/// composing matrices; the translation is kept. Degenerate columns fall back
/// to the matching identity axis.
pub fn orthonormalize(matrix: &Mat4) -> Mat4 {
    let basis: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();

    let x = basis.column(0).into_owned().try_normalize(f32::EPSILON).unwrap_or_else(Vec3::x);
    let y_raw = basis.column(1).into_owned();
    let y = (y_raw - x * x.dot(&y_raw))
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(|| any_perpendicular(&x));
    let z = x.cross(&y);

    let mut result = Mat4::identity();
    result.fixed_view_mut::<3, 1>(0, 0).copy_from(&x);
    result.fixed_view_mut::<3, 1>(0, 1).copy_from(&y);
    result.fixed_view_mut::<3, 1>(0, 2).copy_from(&z);
    result.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation(matrix));
    result
}

/// Rotation of an orthonormal affine matrix as a quaternion
pub fn rotation(matrix: &Mat4) -> Quat {
    let basis: Mat3 = orthonormalize(matrix).fixed_view::<3, 3>(0, 0).into_owned();
    Quat::from_matrix(&basis)
}

fn any_perpendicular(axis: &Vec3) -> Vec3 {
    let candidate = if axis.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    (candidate - axis * axis.dot(&candidate)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_to_matrix_applies_scale_rotation_translation() {
        let transform = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
            Vec3::new(2.0, 1.0, 1.0),
        );
        let point = transform.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));

        // (1,0,0) scaled to (2,0,0), rotated to (0,2,0), translated
        assert_relative_eq!(point, Point3::new(1.0, 4.0, 3.0), epsilon = EPSILON);
    }

    #[test]
    fn test_orthonormalize_strips_scale_keeps_translation() {
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), 0.7);
        let matrix = Transform::new(Vec3::new(4.0, -1.0, 2.0), rotation, Vec3::new(3.0, 0.5, 2.0))
            .to_matrix();

        let clean = orthonormalize(&matrix);

        assert_relative_eq!(axis_scale(&clean), Vec3::new(1.0, 1.0, 1.0), epsilon = EPSILON);
        assert_relative_eq!(translation(&clean), Vec3::new(4.0, -1.0, 2.0), epsilon = EPSILON);
        assert_relative_eq!(clean, Transform::new(Vec3::new(4.0, -1.0, 2.0), rotation, Vec3::new(1.0, 1.0, 1.0)).to_matrix(), epsilon = EPSILON);
    }

    #[test]
    fn test_orthonormalize_degenerate_basis() {
        let matrix = Mat4::new_nonuniform_scaling(&Vec3::new(0.0, 0.0, 0.0));
        let clean = orthonormalize(&matrix);
        assert_relative_eq!(clean, Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_rotation_roundtrip() {
        let rotation_in = Quat::from_euler_angles(0.3, -0.2, 1.1);
        let matrix = Transform::new(Vec3::zeros(), rotation_in, Vec3::new(2.0, 2.0, 2.0)).to_matrix();
        assert_relative_eq!(rotation(&matrix).angle_to(&rotation_in), 0.0, epsilon = 1e-3);
    }
}
