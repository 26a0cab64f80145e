use nalgebra::{Point3, Vector3};

use crate::math::smooth_min;

/// A signed distance bound. Implementations must never report a distance larger than the true
/// distance to the nearest surface, or marching will step through geometry.
pub trait Sdf {
    fn distance(&self, p: &Point3<f32>) -> f32;
}

impl<F> Sdf for F
where
    F: Fn(&Point3<f32>) -> f32,
{
    #[inline]
    fn distance(&self, p: &Point3<f32>) -> f32 {
        self(p)
    }
}

/// Primitive shapes, positioned in object space.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A sphere whose center oscillates as `center + sway * sin(time)`.
    Sphere {
        center: Point3<f32>,
        radius: f32,
        sway: Vector3<f32>,
    },
}

impl Primitive {
    /// A sphere that stays put.
    pub fn sphere(center: Point3<f32>, radius: f32) -> Self {
        Primitive::Sphere {
            center,
            radius,
            sway: Vector3::zeros(),
        }
    }

    /// A sphere that oscillates around `center`.
    pub fn swaying_sphere(center: Point3<f32>, radius: f32, sway: Vector3<f32>) -> Self {
        Primitive::Sphere {
            center,
            radius,
            sway,
        }
    }

    /// Fix the animated parameters of the primitive at `time`.
    fn at(&self, time: f32) -> Resolved {
        match self {
            Primitive::Sphere {
                center,
                radius,
                sway,
            } => Resolved::Sphere {
                center: center + sway * time.sin(),
                radius: *radius,
            },
        }
    }
}

/// A primitive with its animation resolved for a single frame.
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Sphere { center: Point3<f32>, radius: f32 },
}

impl Resolved {
    #[inline]
    fn sdf(&self, p: &Point3<f32>) -> f32 {
        match self {
            Resolved::Sphere { center, radius } => (p - center).norm() - radius,
        }
    }
}

/// An ordered set of primitives merged with a smooth union.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub primitives: Vec<Primitive>,

    /// The blend radius for the smooth union. Zero gives a hard union.
    pub blend: f32,
}

impl Default for Scene {
    /// Two small spheres that swing through each other along the x axis.
    fn default() -> Self {
        Self {
            primitives: vec![
                Primitive::swaying_sphere(Point3::origin(), 0.1, Vector3::new(0.35, 0., 0.)),
                Primitive::swaying_sphere(Point3::origin(), 0.1, Vector3::new(-0.35, 0., 0.)),
            ],
            blend: 0.5,
        }
    }
}

impl Scene {
    /// A scene with no primitives.
    pub fn empty(blend: f32) -> Self {
        Self {
            primitives: Vec::new(),
            blend,
        }
    }

    pub fn with_primitive(mut self, prim: Primitive) -> Self {
        self.primitives.push(prim);
        self
    }

    /// Freeze the scene at `time`, producing the distance field for a single frame.
    pub fn field(&self, time: f32) -> Field {
        Field {
            prims: self.primitives.iter().map(|p| p.at(time)).collect(),
            blend: self.blend,
        }
    }
}

/// The distance field of a [`Scene`] at a fixed time. Evaluation is pure, so a single field can
/// be shared by every worker rendering the frame.
#[derive(Debug, Clone)]
pub struct Field {
    prims: Vec<Resolved>,
    blend: f32,
}

impl Sdf for Field {
    fn distance(&self, p: &Point3<f32>) -> f32 {
        let mut dists = self.prims.iter().map(|prim| prim.sdf(p));
        match dists.next() {
            Some(first) => dists.fold(first, |acc, d| smooth_min(acc, d, self.blend)),
            None => f32::INFINITY,
        }
    }
}
