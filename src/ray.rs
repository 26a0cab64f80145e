use nalgebra::{Matrix4, Point3, Unit, Vector3};

use crate::transform::ApplyTransform;

#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    /// Construct a new ray.
    pub fn new(origin: Point3<f32>, direction: Unit<Vector3<f32>>) -> Ray {
        Ray { origin, direction }
    }

    /// The point `t` units along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.scale(t)
    }
}

impl ApplyTransform for Ray {
    /// The origin moves as a point and the direction as a vector, which is renormalized
    /// afterwards.
    #[inline]
    fn apply(&self, m: &Matrix4<f32>) -> Self {
        Ray::new(self.origin.apply(m), self.direction.apply(m))
    }
}
