use nalgebra::{Point3, Unit, Vector3};

use crate::scene::Sdf;

/// The default offset used for the finite differences.
pub const NORMAL_EPSILON: f32 = 0.001;

/// Estimate the surface normal at `p` from the central differences of the distance field along
/// each axis. This is only meaningful near a surface; returns `None` when the gradient vanishes.
pub fn estimate_normal<S: Sdf + ?Sized>(
    sdf: &S,
    p: &Point3<f32>,
    epsilon: f32,
) -> Option<Unit<Vector3<f32>>> {
    let offset = Vector3::new(epsilon, 0.0, 0.0);

    let diff = |off: Vector3<f32>| sdf.distance(&(p + off)) - sdf.distance(&(p - off));

    let gradient = Vector3::new(
        diff(offset.xyy()),
        diff(offset.yxy()),
        diff(offset.yyx()),
    );

    Unit::try_new(gradient, f32::EPSILON)
}
