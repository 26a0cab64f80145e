use std::time::Instant;

use crossbeam::{channel, thread};
use log::{debug, info, trace};

use crate::{
    camera::{CameraRays, FrameError, RayGenerator, RayStrategy, Sample},
    canvas::{Canvas, Color},
    frame::FrameState,
    march::{march, MarchConfig},
    normal::NORMAL_EPSILON,
    scene::{Scene, Sdf},
    shade::Shading,
};

const TILE_SIZE: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub march: MarchConfig,
    pub strategy: RayStrategy,
    pub shading: Shading,
    pub normal_epsilon: f32,
    pub jobs: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            march: MarchConfig::default(),
            strategy: RayStrategy::default(),
            shading: Shading::default(),
            normal_epsilon: NORMAL_EPSILON,
            jobs: num_cpus::get(),
        }
    }
}

impl RenderConfig {
    pub fn with_march(mut self, march: MarchConfig) -> Self {
        self.march = march;
        self
    }

    pub fn with_strategy(mut self, strategy: RayStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    pub fn with_normal_epsilon(mut self, epsilon: f32) -> Self {
        self.normal_epsilon = epsilon;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

/// A rectangle of pixels shaded as a unit of work.
#[derive(Debug, Clone, PartialEq)]
struct Tile {
    offset_x: u32,
    offset_y: u32,
    width: u32,
    height: u32,
}

/// Cover a `width` by `height` target with tiles of at most [`TILE_SIZE`] pixels a side, row by
/// row from the bottom-left. Tiles on the right and top edges are clipped to the target.
fn tiles(width: u32, height: u32) -> impl Iterator<Item = Tile> {
    (0..height).step_by(TILE_SIZE as usize).flat_map(move |offset_y| {
        (0..width)
            .step_by(TILE_SIZE as usize)
            .map(move |offset_x| Tile {
                offset_x,
                offset_y,
                width: TILE_SIZE.min(width - offset_x),
                height: TILE_SIZE.min(height - offset_y),
            })
    })
}

/// Run the whole pipeline for a single sample: generate the ray, march it through `sdf`, and
/// shade the result.
pub fn trace_pixel<R, S>(config: &RenderConfig, rays: &R, sdf: &S, sample: &Sample) -> Color
where
    R: RayGenerator + ?Sized,
    S: Sdf + ?Sized,
{
    let ray = rays.generate_ray(sample);
    let res = march(&config.march, sdf, ray);
    config
        .shading
        .shade(&config.march, config.normal_epsilon, sdf, &res)
}

/// Render `scene` as seen by `frame`, splitting the target into tiles that are shaded in parallel
/// by `config.jobs` workers.
pub fn render_frame(
    config: &RenderConfig,
    scene: &Scene,
    frame: &FrameState,
) -> Result<Canvas, FrameError> {
    let start = Instant::now();

    let rays = CameraRays::new(frame, &config.strategy)?;
    let field = scene.field(frame.time);

    let mut canvas = Canvas::new(frame.width(), frame.height());
    let work = tiles(frame.width(), frame.height());
    let jobs = config.jobs.max(1);

    info!(
        "rendering {}x{} frame at t={:.3}s with {} jobs",
        frame.width(),
        frame.height(),
        frame.time,
        jobs
    );
    debug!(
        "{} tiles, strategy {:?}",
        frame.width().div_ceil(TILE_SIZE) * frame.height().div_ceil(TILE_SIZE),
        config.strategy
    );

    let (input, queue) = channel::unbounded::<Tile>();
    let (results, chunks) = channel::unbounded();

    thread::scope(|s| {
        for worker in 0..jobs {
            let results = results.clone();
            let queue = queue.clone();
            let rays = &rays;
            let field = &field;
            s.spawn(move |_| {
                for tile in queue {
                    trace!("worker {} shading tile {:?}", worker, tile);
                    let mut chunk = Canvas::new(tile.width, tile.height);

                    for ((col, row), pixel) in chunk.coords().zip(chunk.pixels_mut()) {
                        let sample = Sample::pixel(col + tile.offset_x, row + tile.offset_y);
                        *pixel = trace_pixel(config, rays, field, &sample);
                    }

                    if results.send((tile, chunk)).is_err() {
                        break;
                    }
                }
            });
        }

        // Only the workers hold senders now, so the results run dry once they are all done.
        drop(results);

        s.spawn(move |_| {
            for tile in work {
                if input.send(tile).is_err() {
                    break;
                }
            }
        });

        for (tile, chunk) in chunks {
            canvas.blit(tile.offset_x, tile.offset_y, &chunk);
        }
    })
    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));

    info!("frame finished in {:?}", start.elapsed());

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Camera, Projection, Resolution};
    use crate::scene::Primitive;
    use crate::shade::background;
    use crate::transform::Transform;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix4, Point3, Vector3};

    fn lone_sphere() -> Scene {
        Scene::empty(0.5).with_primitive(Primitive::sphere(Point3::origin(), 0.5))
    }

    fn front_view(size: u32) -> FrameState {
        FrameState::new(0., size, size, Point3::new(0., 0., 4.), -Vector3::z_axis())
    }

    #[test]
    fn test_tiles() {
        assert_eq!(0, tiles(0, 0).count());
        assert_eq!(0, tiles(0, 5).count());

        assert_eq!(
            vec![Tile {
                offset_x: 0,
                offset_y: 0,
                width: 1,
                height: 1
            }],
            tiles(1, 1).collect::<Vec<_>>()
        );

        let grid: Vec<Tile> = tiles(40, 20).collect();
        assert_eq!(6, grid.len());
        assert_eq!(32, grid[2].offset_x);
        assert_eq!(8, grid[2].width);
        assert_eq!(16, grid[5].offset_y);
        assert_eq!(4, grid[5].height);

        let covered: u32 = grid.iter().map(|t| t.width * t.height).sum();
        assert_eq!(40 * 20, covered);
    }

    #[test]
    fn test_center_pixel_hits_sphere() {
        let config = RenderConfig::default();
        let frame = front_view(101);
        let rays = CameraRays::new(&frame, &config.strategy).expect("prepare");
        let field = lone_sphere().field(frame.time);

        let color = trace_pixel(&config, &rays, &field, &Sample::pixel(50, 50));
        assert_abs_diff_eq!(0.5, color.r, epsilon = 1e-3);
        assert_abs_diff_eq!(0.5, color.g, epsilon = 1e-3);
        assert_abs_diff_eq!(1.0, color.b, epsilon = 1e-3);
        assert_eq!(1.0, color.a);

        let ray = rays.generate_ray(&Sample::pixel(50, 50));
        let res = march(&config.march, &field, ray);
        assert!(res.hit());
        assert_abs_diff_eq!(3.5, res.distance, epsilon = config.march.surf_dist);
    }

    #[test]
    fn test_corner_pixel_misses_sphere() {
        let config = RenderConfig::default();
        let frame = front_view(101);
        let rays = CameraRays::new(&frame, &config.strategy).expect("prepare");
        let field = lone_sphere().field(frame.time);

        for (x, y) in [(0, 0), (100, 100), (0, 100), (100, 0), (95, 50)] {
            let color = trace_pixel(&config, &rays, &field, &Sample::pixel(x, y));
            assert_eq!(background(), color);
        }
    }

    #[test]
    fn test_render_frame_matches_single_pixels() {
        let config = RenderConfig::default().with_jobs(3);
        let scene = Scene::default();
        let camera = Camera::new(
            Point3::new(0., 0., 4.),
            Point3::origin(),
            Projection::Orthographic { zoom: 100. },
        );
        let frame = camera.frame(0.8, Resolution::new(37, 21), &Transform::new());
        let canvas = render_frame(&config, &scene, &frame).expect("render");

        assert_eq!(37, canvas.width());
        assert_eq!(21, canvas.height());

        let rays = CameraRays::new(&frame, &config.strategy).expect("prepare");
        let field = scene.field(frame.time);
        for (x, y) in canvas.coords() {
            let expected = trace_pixel(&config, &rays, &field, &Sample::pixel(x, y));
            assert_eq!(expected, *canvas.get(x, y));
        }
    }

    #[test]
    fn test_render_frame_every_strategy() {
        let resolution = Resolution::new(25, 25);
        let cameras = [
            // A half-height of one world unit, which matches the default basis extent.
            Camera::new(
                Point3::new(0., 0., 4.),
                Point3::origin(),
                Projection::Orthographic { zoom: 12.5 },
            ),
            Camera::new(
                Point3::new(0., 0., 4.),
                Point3::origin(),
                Projection::Perspective {
                    fov: std::f32::consts::FRAC_PI_2,
                },
            ),
        ];
        let strategies = [
            RayStrategy::default(),
            RayStrategy::UnprojectViewProjection {
                origin: crate::camera::RayOrigin::Camera,
            },
            RayStrategy::UnprojectViewProjection {
                origin: crate::camera::RayOrigin::NearPlane,
            },
            RayStrategy::UnprojectModelView,
        ];

        for camera in &cameras {
            let frame = camera.frame(0., resolution, &Transform::new());
            for strategy in strategies {
                let config = RenderConfig::default().with_jobs(2).with_strategy(strategy);
                let canvas = render_frame(&config, &lone_sphere(), &frame).expect("render");
                assert_eq!(25 * 25 * 4, canvas.data().len());
                assert!(canvas.coords().all(|(x, y)| canvas.get(x, y).a == 1.0));

                let center = canvas.get(12, 12);
                assert_abs_diff_eq!(0.5, center.r, epsilon = 1e-3);
                assert_abs_diff_eq!(0.5, center.g, epsilon = 1e-3);
                assert_abs_diff_eq!(1.0, center.b, epsilon = 1e-3);

                for (x, y) in [(0, 0), (24, 24), (0, 24), (24, 0)] {
                    assert_eq!(background(), *canvas.get(x, y), "{:?}", strategy);
                }
            }
        }
    }

    #[test]
    fn test_render_frame_singular() {
        let frame = front_view(8).with_view_projection(Matrix4::zeros());
        let config = RenderConfig::default().with_strategy(RayStrategy::UnprojectViewProjection {
            origin: crate::camera::RayOrigin::Camera,
        });
        assert!(render_frame(&config, &lone_sphere(), &frame).is_err());
    }
}
