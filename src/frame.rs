use nalgebra::{Matrix4, Orthographic3, Perspective3, Point3, Unit, Vector2, Vector3};

use crate::transform::Transform;

pub type Resolution = Vector2<u32>;

/// Everything the renderer needs to know about a single frame. The host builds one of these per
/// frame and it is only ever read while the frame renders.
///
/// The vectors must be normalized and the matrices invertible; nothing here checks that the
/// values agree with each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Seconds on the host's clock.
    pub time: f32,

    /// The size of the render target in pixels.
    pub resolution: Resolution,

    pub camera_position: Point3<f32>,

    /// The world-space forward direction of the camera.
    pub camera_direction: Unit<Vector3<f32>>,

    /// World to clip space.
    pub view_projection: Matrix4<f32>,

    /// World to the object space of the rendered primitive.
    pub inverse_model: Matrix4<f32>,

    /// Object to view space. Only read by the model-view unprojection strategy.
    pub model_view: Matrix4<f32>,

    /// View to clip space. Only read by the model-view unprojection strategy.
    pub projection: Matrix4<f32>,
}

impl FrameState {
    /// A frame with identity matrices, for hosts that only use the orthographic basis strategy.
    pub fn new(
        time: f32,
        width: u32,
        height: u32,
        camera_position: Point3<f32>,
        camera_direction: Unit<Vector3<f32>>,
    ) -> Self {
        Self {
            time,
            resolution: Resolution::new(width.max(1), height.max(1)),
            camera_position,
            camera_direction,
            view_projection: Matrix4::identity(),
            inverse_model: Matrix4::identity(),
            model_view: Matrix4::identity(),
            projection: Matrix4::identity(),
        }
    }

    pub fn with_view_projection(mut self, view_projection: Matrix4<f32>) -> Self {
        self.view_projection = view_projection;
        self
    }

    pub fn with_inverse_model(mut self, inverse_model: Matrix4<f32>) -> Self {
        self.inverse_model = inverse_model;
        self
    }

    pub fn with_model_view(mut self, model_view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        self.model_view = model_view;
        self.projection = projection;
        self
    }

    pub fn width(&self) -> u32 {
        self.resolution.x
    }

    pub fn height(&self) -> u32 {
        self.resolution.y
    }

    /// Compute the aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.resolution.x as f32 / self.resolution.y as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// A parallel projection, with `zoom` pixels per world unit.
    Orthographic { zoom: f32 },

    /// A pinhole projection with the given vertical field of view, in radians.
    Perspective { fov: f32 },
}

/// The host's camera, which knows how to produce the [`FrameState`] for each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Unit<Vector3<f32>>,
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0., 0., 4.),
            Point3::origin(),
            Projection::Orthographic { zoom: 300. },
        )
    }
}

impl Camera {
    pub fn new(position: Point3<f32>, target: Point3<f32>, projection: Projection) -> Self {
        Self {
            position,
            target,
            up: Vector3::y_axis(),
            projection,
            near: 0.1,
            far: 1000.,
        }
    }

    /// Place the camera `distance` units from the origin, looking at it. The azimuth is measured
    /// around the y axis from +z, and the elevation is kept just short of the poles.
    pub fn orbit(distance: f32, azimuth: f32, elevation: f32, projection: Projection) -> Self {
        let limit = std::f32::consts::FRAC_PI_2 - 1e-3;
        let elevation = elevation.clamp(-limit, limit);
        let position = Point3::new(
            distance * elevation.cos() * azimuth.sin(),
            distance * elevation.sin(),
            distance * elevation.cos() * azimuth.cos(),
        );
        Self::new(position, Point3::origin(), projection)
    }

    /// The world-space forward direction.
    pub fn direction(&self) -> Unit<Vector3<f32>> {
        Unit::try_new(self.target - self.position, f32::EPSILON).unwrap_or(-Vector3::z_axis())
    }

    /// World to view space.
    pub fn view(&self) -> Matrix4<f32> {
        let forward = self.direction();
        let up = if forward.cross(self.up.as_ref()).norm() < 1e-6 {
            Vector3::z()
        } else {
            self.up.into_inner()
        };
        Matrix4::look_at_rh(&self.position, &(self.position + forward.into_inner()), &up)
    }

    /// View to clip space for a target of the given size.
    pub fn projection_matrix(&self, resolution: &Resolution) -> Matrix4<f32> {
        let width = resolution.x.max(1) as f32;
        let height = resolution.y.max(1) as f32;
        match self.projection {
            Projection::Orthographic { zoom } => {
                let half_w = width / (2. * zoom);
                let half_h = height / (2. * zoom);
                Orthographic3::new(-half_w, half_w, -half_h, half_h, self.near, self.far)
                    .to_homogeneous()
            }
            Projection::Perspective { fov } => {
                Perspective3::new(width / height, fov, self.near, self.far).to_homogeneous()
            }
        }
    }

    /// The world units covered by half the height of the target, for orthographic projections.
    /// This is the `extent` that makes the orthographic basis strategy frame the same view.
    pub fn ortho_extent(&self, resolution: &Resolution) -> Option<f32> {
        match self.projection {
            Projection::Orthographic { zoom } => Some(resolution.y.max(1) as f32 / (2. * zoom)),
            Projection::Perspective { .. } => None,
        }
    }

    /// Build the complete state for a frame at `time`, rendering the object placed by `model`.
    pub fn frame(&self, time: f32, resolution: Resolution, model: &Transform) -> FrameState {
        let view = self.view();
        let projection = self.projection_matrix(&resolution);

        FrameState::new(
            time,
            resolution.x,
            resolution.y,
            self.position,
            self.direction(),
        )
        .with_view_projection(projection * view)
        .with_inverse_model(*model.inverse())
        .with_model_view(view * model.matrix(), projection)
    }
}
