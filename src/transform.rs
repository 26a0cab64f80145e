use std::ops::Neg;

use nalgebra::{Matrix4, Point3, Unit, Vector3};

/// An affine transform that keeps its inverse up to date, so that it can never become singular
/// without the construction itself failing.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
    inverse: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    /// The object-to-world matrix.
    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    /// The world-to-object matrix.
    pub fn inverse(&self) -> &Matrix4<f32> {
        &self.inverse
    }

    /// Append a translation to this transform.
    pub fn translate(mut self, vec: &Vector3<f32>) -> Self {
        self.matrix.append_translation_mut(vec);
        self.inverse.prepend_translation_mut(&vec.neg());
        self
    }

    /// Append a uniform scaling to this transform. Non-positive amounts are ignored, as they
    /// would collapse or mirror the object.
    pub fn uniform_scale(mut self, amount: f32) -> Self {
        if amount > 0.0 {
            self.matrix.append_scaling_mut(amount);
            self.inverse.prepend_scaling_mut(1.0 / amount);
        }
        self
    }

    /// Compose an axis-angle rotation in object space, applied before anything already in the
    /// transform.
    pub fn rotate(mut self, axisangle: &Vector3<f32>) -> Self {
        self.matrix *= Matrix4::new_rotation(*axisangle);
        self.inverse = Matrix4::new_rotation(axisangle.neg()) * self.inverse;
        self
    }

    /// Rotate by euler angles in radians. The result is `Rx * Ry * Rz`, so the Z rotation reaches
    /// the object first.
    pub fn rotate_xyz(self, angles: &Vector3<f32>) -> Self {
        self.rotate(&Vector3::new(angles.x, 0., 0.))
            .rotate(&Vector3::new(0., angles.y, 0.))
            .rotate(&Vector3::new(0., 0., angles.z))
    }
}

/// Things that can be moved by a homogeneous matrix.
pub trait ApplyTransform {
    fn apply(&self, m: &Matrix4<f32>) -> Self;
}

impl ApplyTransform for Point3<f32> {
    #[inline]
    fn apply(&self, m: &Matrix4<f32>) -> Self {
        m.transform_point(self)
    }
}

impl ApplyTransform for Vector3<f32> {
    /// Directions ignore the translation part of the matrix.
    #[inline]
    fn apply(&self, m: &Matrix4<f32>) -> Self {
        m.transform_vector(self)
    }
}

impl ApplyTransform for Unit<Vector3<f32>> {
    #[inline]
    fn apply(&self, m: &Matrix4<f32>) -> Self {
        Unit::new_normalize(self.as_ref().apply(m))
    }
}
