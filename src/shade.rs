use nalgebra::{Unit, Vector3};

use crate::canvas::Color;
use crate::march::{MarchConfig, MarchResult};
use crate::normal::estimate_normal;
use crate::scene::Sdf;

/// The color of rays that miss everything: the `#eeeeee` page background the renderer is
/// composited over.
pub fn background() -> Color {
    Color::hex(0xeeeeee)
}

/// Ways of turning a march into a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    /// Visualize the surface orientation, mapping each normal component from `[-1,1]` to `[0,1]`.
    #[default]
    Normals,

    /// Color hits by how few steps it took to reach them. Misses are black.
    ///
    /// This makes it easy to spot the grazing rays that eat up the step budget.
    Steps,
}

impl Shading {
    pub fn shade<S: Sdf + ?Sized>(
        &self,
        config: &MarchConfig,
        normal_epsilon: f32,
        sdf: &S,
        res: &MarchResult,
    ) -> Color {
        match self {
            Shading::Normals => {
                if !res.hit() {
                    return background();
                }

                // A vanishing gradient faces the viewer instead of producing NaN.
                let normal = estimate_normal(sdf, &res.point(), normal_epsilon)
                    .unwrap_or_else(|| -res.ray.direction);
                normal_color(&normal)
            }

            Shading::Steps => {
                if !res.hit() {
                    return Color::black();
                }

                let step_val = 1.0 - (res.steps as f32) / (config.max_steps as f32);
                Color::new(step_val, 0.0, step_val)
            }
        }
    }
}

/// Map a unit normal to an opaque color.
pub fn normal_color(normal: &Unit<Vector3<f32>>) -> Color {
    Color::new(
        normal.x * 0.5 + 0.5,
        normal.y * 0.5 + 0.5,
        normal.z * 0.5 + 0.5,
    )
}
