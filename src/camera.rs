use log::debug;
use nalgebra::{Matrix4, Point2, Point3, Unit, Vector3};
use thiserror::Error;

use crate::frame::FrameState;
use crate::ray::Ray;
use crate::transform::ApplyTransform;

#[derive(Error, Debug, PartialEq)]
pub enum FrameError {
    #[error("the {0} matrix is not invertible")]
    Singular(&'static str),
}

/// Where rays from the view-projection unprojection start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayOrigin {
    /// Every ray leaves the camera position, through its pixel on the near plane.
    Camera,

    /// Rays leave their pixel on the near plane, heading towards the same pixel on the far plane.
    NearPlane,
}

/// The ways a pixel can be turned into a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayStrategy {
    /// Parallel rays offset from the camera position along a basis built from the camera's
    /// forward direction and world up.
    OrthographicBasis {
        /// Stretch the horizontal axis by the aspect ratio of the target.
        aspect_correct: bool,

        /// World units covered by half of the screen.
        extent: f32,
    },

    /// Unproject through the inverse of the combined view-projection matrix.
    UnprojectViewProjection { origin: RayOrigin },

    /// Unproject the near and far points through the inverse projection and inverse model-view
    /// matrices, which land directly in object space. Rays start on the near plane.
    UnprojectModelView,
}

impl Default for RayStrategy {
    fn default() -> Self {
        RayStrategy::OrthographicBasis {
            aspect_correct: true,
            extent: 1.,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sample {
    /// The point on the film where the ray originates, in pixels from the bottom-left corner.
    pub film: Point2<f32>,
}

impl Sample {
    pub fn new(fx: f32, fy: f32) -> Self {
        Self {
            film: Point2::new(fx, fy),
        }
    }

    /// The center of the pixel at column `x` and row `y`.
    pub fn pixel(x: u32, y: u32) -> Self {
        Self::new(x as f32 + 0.5, y as f32 + 0.5)
    }
}

pub trait RayGenerator {
    /// Given a [`Sample`], generate a ray in object space.
    fn generate_ray(&self, sample: &Sample) -> Ray;
}

/// The secondary up axis, used when the camera looks straight along world up.
const FALLBACK_UP: Vector3<f32> = Vector3::new(0., 0., 1.);

#[derive(Debug, Clone)]
enum Prepared {
    Basis {
        position: Point3<f32>,
        forward: Unit<Vector3<f32>>,
        right: Vector3<f32>,
        up: Vector3<f32>,
        scale_x: f32,
        scale_y: f32,
        inverse_model: Matrix4<f32>,
    },

    ViewProjection {
        inverse: Matrix4<f32>,
        camera: Point3<f32>,
        origin: RayOrigin,
        inverse_model: Matrix4<f32>,
    },

    ModelView {
        inverse_projection: Matrix4<f32>,
        inverse_model_view: Matrix4<f32>,
    },
}

/// A [`RayStrategy`] bound to a single frame, with everything that is shared between pixels
/// worked out up front.
#[derive(Debug, Clone)]
pub struct CameraRays {
    width: f32,
    height: f32,
    prepared: Prepared,
}

impl CameraRays {
    pub fn new(frame: &FrameState, strategy: &RayStrategy) -> Result<Self, FrameError> {
        let prepared = match *strategy {
            RayStrategy::OrthographicBasis {
                aspect_correct,
                extent,
            } => {
                let forward = frame.camera_direction;
                let (right, up) = basis(&forward);
                let aspect = if aspect_correct {
                    frame.aspect_ratio()
                } else {
                    1.
                };
                Prepared::Basis {
                    position: frame.camera_position,
                    forward,
                    right,
                    up,
                    scale_x: aspect * extent,
                    scale_y: extent,
                    inverse_model: frame.inverse_model,
                }
            }

            RayStrategy::UnprojectViewProjection { origin } => Prepared::ViewProjection {
                inverse: frame
                    .view_projection
                    .try_inverse()
                    .ok_or(FrameError::Singular("view-projection"))?,
                camera: frame.camera_position,
                origin,
                inverse_model: frame.inverse_model,
            },

            RayStrategy::UnprojectModelView => {
                let inverse_projection = frame
                    .projection
                    .try_inverse()
                    .ok_or(FrameError::Singular("projection"))?;
                let inverse_model_view = frame
                    .model_view
                    .try_inverse()
                    .ok_or(FrameError::Singular("model-view"))?;
                Prepared::ModelView {
                    inverse_projection,
                    inverse_model_view,
                }
            }
        };

        Ok(Self {
            width: frame.width() as f32,
            height: frame.height() as f32,
            prepared,
        })
    }

    /// Map a film position to normalized device coordinates, with `(-1, -1)` at the bottom-left
    /// corner of the target and `(1, 1)` at the top-right.
    pub fn ndc(&self, sample: &Sample) -> Point2<f32> {
        Point2::new(
            sample.film.x / self.width * 2. - 1.,
            sample.film.y / self.height * 2. - 1.,
        )
    }
}

/// Build the right and up vectors for a camera looking along `forward`.
fn basis(forward: &Unit<Vector3<f32>>) -> (Vector3<f32>, Vector3<f32>) {
    let right = Unit::try_new(Vector3::y().cross(forward.as_ref()), 1e-6)
        .or_else(|| {
            debug!("camera looks along world up, using {:?} as up", FALLBACK_UP);
            Unit::try_new(FALLBACK_UP.cross(forward.as_ref()), 1e-6)
        })
        .map_or_else(Vector3::x, Unit::into_inner);
    let up = forward.cross(&right);
    (right, up)
}

impl RayGenerator for CameraRays {
    fn generate_ray(&self, sample: &Sample) -> Ray {
        let ndc = self.ndc(sample);
        match &self.prepared {
            Prepared::Basis {
                position,
                forward,
                right,
                up,
                scale_x,
                scale_y,
                inverse_model,
            } => {
                let origin = position + right * (ndc.x * scale_x) + up * (ndc.y * scale_y);
                Ray::new(origin, *forward).apply(inverse_model)
            }

            Prepared::ViewProjection {
                inverse,
                camera,
                origin,
                inverse_model,
            } => {
                let near = Point3::new(ndc.x, ndc.y, -1.).apply(inverse);
                let ray = match origin {
                    RayOrigin::Camera => Ray::new(*camera, Unit::new_normalize(near - camera)),
                    RayOrigin::NearPlane => {
                        let far = Point3::new(ndc.x, ndc.y, 1.).apply(inverse);
                        Ray::new(near, Unit::new_normalize(far - near))
                    }
                };
                ray.apply(inverse_model)
            }

            Prepared::ModelView {
                inverse_projection,
                inverse_model_view,
            } => {
                let unproject = |z: f32| {
                    Point3::new(ndc.x, ndc.y, z)
                        .apply(inverse_projection)
                        .apply(inverse_model_view)
                };
                let near = unproject(-1.);
                let far = unproject(1.);
                Ray::new(near, Unit::new_normalize(far - near))
            }
        }
    }
}
