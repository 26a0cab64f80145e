use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::info;
use nalgebra::Vector3;

use sdf_march::{
    camera::{RayOrigin, RayStrategy},
    frame::{Camera, Projection, Resolution},
    march::MarchConfig,
    math::deg_to_rad,
    parser,
    render::{render_frame, RenderConfig},
    scene::Scene,
    shade::Shading,
    transform::Transform,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Parallel rays along a basis built from the camera direction.
    Ortho,
    /// Unproject through the view-projection matrix, starting at the camera.
    ViewProjection,
    /// Unproject through the view-projection matrix, starting on the near plane.
    NearPlane,
    /// Unproject through the projection and model-view matrices.
    ModelView,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShadingArg {
    Normals,
    Steps,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProjectionArg {
    Orthographic,
    Perspective,
}

#[derive(Parser, Debug)]
#[command(version, about = "Render a signed distance field by sphere tracing")]
struct Options {
    /// Scene description to render instead of the built-in pair of spheres.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Output image. A `{}` in the name is replaced by the frame number.
    #[arg(short, long, default_value = "out.png")]
    output: String,

    /// Print an ascii preview of each frame.
    #[arg(long)]
    ascii: bool,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Scene time of the first frame, in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f32,

    /// Number of frames to render.
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Frames per second of scene time.
    #[arg(long, default_value_t = 24.0)]
    fps: f32,

    /// Number of worker threads, defaulting to the number of cpus.
    #[arg(short, long)]
    jobs: Option<usize>,

    #[arg(long, value_enum, default_value_t = StrategyArg::Ortho)]
    strategy: StrategyArg,

    /// World units covered by half the screen height, for the ortho strategy. Defaults to the
    /// span picked by --zoom, or one unit with a perspective projection.
    #[arg(long)]
    extent: Option<f32>,

    /// Don't stretch the ortho strategy's horizontal axis by the aspect ratio.
    #[arg(long)]
    no_aspect: bool,

    #[arg(long, value_enum, default_value_t = ShadingArg::Normals)]
    shading: ShadingArg,

    #[arg(long, value_enum, default_value_t = ProjectionArg::Orthographic)]
    projection: ProjectionArg,

    /// Pixels per world unit of the orthographic projection. Also sets the default --extent.
    #[arg(long, default_value_t = 300.0)]
    zoom: f32,

    /// Vertical field of view of the perspective projection, in degrees.
    #[arg(long, default_value_t = 40.0)]
    fov: f32,

    /// Distance of the camera from the origin.
    #[arg(long, default_value_t = 4.0)]
    distance: f32,

    /// Camera angle around the y axis, in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    azimuth: f32,

    /// Camera angle above the xz plane, in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    elevation: f32,

    /// Euler rotation of the rendered object, in degrees.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    rotate: Option<Vec<f32>>,

    /// Position of the rendered object.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    translate: Option<Vec<f32>>,

    /// Uniform scale of the rendered object.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    #[arg(long, default_value_t = 100)]
    max_steps: u32,

    #[arg(long, default_value_t = 0.001)]
    surf_dist: f32,

    #[arg(long, default_value_t = 20.0)]
    max_dist: f32,
}

impl Options {
    fn render_config(&self) -> RenderConfig {
        let strategy = match self.strategy {
            StrategyArg::Ortho => RayStrategy::OrthographicBasis {
                aspect_correct: !self.no_aspect,
                extent: self.extent(),
            },
            StrategyArg::ViewProjection => RayStrategy::UnprojectViewProjection {
                origin: RayOrigin::Camera,
            },
            StrategyArg::NearPlane => RayStrategy::UnprojectViewProjection {
                origin: RayOrigin::NearPlane,
            },
            StrategyArg::ModelView => RayStrategy::UnprojectModelView,
        };

        let shading = match self.shading {
            ShadingArg::Normals => Shading::Normals,
            ShadingArg::Steps => Shading::Steps,
        };

        let mut config = RenderConfig::default()
            .with_strategy(strategy)
            .with_shading(shading)
            .with_march(MarchConfig {
                max_steps: self.max_steps,
                surf_dist: self.surf_dist,
                max_dist: self.max_dist,
            });

        if let Some(jobs) = self.jobs {
            config = config.with_jobs(jobs);
        }

        config
    }

    fn extent(&self) -> f32 {
        self.extent
            .or_else(|| {
                self.camera()
                    .ortho_extent(&Resolution::new(self.width, self.height))
            })
            .unwrap_or(1.0)
    }

    fn camera(&self) -> Camera {
        let projection = match self.projection {
            ProjectionArg::Orthographic => Projection::Orthographic { zoom: self.zoom },
            ProjectionArg::Perspective => Projection::Perspective {
                fov: deg_to_rad(self.fov),
            },
        };
        Camera::orbit(
            self.distance,
            deg_to_rad(self.azimuth),
            deg_to_rad(self.elevation),
            projection,
        )
    }

    fn model(&self) -> Transform {
        let mut model = Transform::new();
        if let Some(angles) = &self.rotate {
            model = model.rotate_xyz(&Vector3::new(
                deg_to_rad(angles[0]),
                deg_to_rad(angles[1]),
                deg_to_rad(angles[2]),
            ));
        }
        model = model.uniform_scale(self.scale);
        if let Some(pos) = &self.translate {
            model = model.translate(&Vector3::new(pos[0], pos[1], pos[2]));
        }
        model
    }

    fn output_path(&self, frame: u32) -> String {
        if self.output.contains("{}") {
            self.output.replace("{}", &format!("{:04}", frame))
        } else if self.frames > 1 {
            match self.output.rsplit_once('.') {
                Some((stem, ext)) => format!("{}-{:04}.{}", stem, frame, ext),
                None => format!("{}-{:04}", self.output, frame),
            }
        } else {
            self.output.clone()
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("the image must be at least one pixel wide and tall");
        }
        if self.scale <= 0.0 {
            bail!("--scale must be positive, as the object transform has to stay invertible");
        }
        if self.fps <= 0.0 {
            bail!("--fps must be positive");
        }
        if self.zoom <= 0.0 {
            bail!("--zoom must be positive");
        }
        if self.extent.map_or(false, |extent| extent <= 0.0) {
            bail!("--extent must be positive");
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let opts = Options::parse();
    opts.validate()?;

    let scene = match &opts.scene {
        Some(path) => parser::load(path)?,
        None => Scene::default(),
    };
    info!(
        "scene has {} primitives, blend {}",
        scene.primitives.len(),
        scene.blend
    );

    let config = opts.render_config();
    let camera = opts.camera();
    let model = opts.model();
    let resolution = Resolution::new(opts.width, opts.height);

    for index in 0..opts.frames {
        let time = opts.time + index as f32 / opts.fps;
        let frame = camera.frame(time, resolution, &model);

        let canvas = render_frame(&config, &scene, &frame)
            .with_context(|| format!("failed to prepare frame {}", index))?;

        if opts.ascii {
            println!("{}", canvas.to_ascii());
        }

        let path = opts.output_path(index);
        canvas.save(&path)?;
        info!("wrote {}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_follows_zoom() {
        let opts = Options::parse_from(["sdf-march"]);
        assert_eq!(1.0, opts.extent());

        let opts = Options::parse_from(["sdf-march", "--zoom", "150"]);
        assert_eq!(2.0, opts.extent());

        let opts = Options::parse_from(["sdf-march", "--zoom", "150", "--extent", "0.25"]);
        assert_eq!(0.25, opts.extent());

        let opts = Options::parse_from(["sdf-march", "--projection", "perspective"]);
        assert_eq!(1.0, opts.extent());
    }
}
