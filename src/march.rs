use crate::ray::Ray;
use crate::scene::Sdf;

#[derive(Debug, Clone, PartialEq)]
pub struct MarchConfig {
    /// The most distance evaluations a single ray may perform.
    pub max_steps: u32,

    /// Distances below this count as touching the surface.
    pub surf_dist: f32,

    /// Rays that travel further than this have escaped the scene.
    pub max_dist: f32,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            surf_dist: 0.001,
            max_dist: 20.,
        }
    }
}

/// How a march came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The ray came within `surf_dist` of a surface.
    Hit,

    /// The ray travelled past `max_dist`.
    Escaped,

    /// The step budget ran out first.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarchResult {
    /// The ray that was marched.
    pub ray: Ray,

    /// The distance traveled along the ray, never more than `max_dist`.
    pub distance: f32,

    /// The number of distance evaluations performed.
    pub steps: u32,

    pub outcome: Outcome,
}

impl MarchResult {
    /// Misses by distance and by budget look the same to everything downstream.
    pub fn hit(&self) -> bool {
        self.outcome == Outcome::Hit
    }

    /// The final position along the ray.
    pub fn point(&self) -> nalgebra::Point3<f32> {
        self.ray.at(self.distance)
    }
}

/// Sphere trace `ray` through `sdf` until it touches a surface, escapes, or runs out of fuel.
pub fn march<S: Sdf + ?Sized>(config: &MarchConfig, sdf: &S, ray: Ray) -> MarchResult {
    let mut total = 0.;

    for i in 0..config.max_steps {
        let radius = sdf.distance(&ray.at(total));

        if radius < config.surf_dist {
            return MarchResult {
                ray,
                distance: total,
                steps: i + 1,
                outcome: Outcome::Hit,
            };
        }

        total += radius;

        if total > config.max_dist {
            return MarchResult {
                ray,
                distance: config.max_dist,
                steps: i + 1,
                outcome: Outcome::Escaped,
            };
        }
    }

    MarchResult {
        ray,
        distance: total,
        steps: config.max_steps,
        outcome: Outcome::Exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Primitive, Scene};
    use approx::assert_abs_diff_eq;
    use nalgebra::{Point3, Unit, Vector3};

    fn unit_sphere(radius: f32) -> impl Sdf {
        move |p: &Point3<f32>| p.coords.norm() - radius
    }

    #[test]
    fn test_hit_head_on() {
        let config = MarchConfig::default();
        for (dist, radius) in [(4.0, 0.5), (10.0, 1.0), (2.0, 1.5), (19.0, 0.25)] {
            let ray = Ray::new(Point3::new(0., 0., dist), -Vector3::z_axis());
            let res = march(&config, &unit_sphere(radius), ray);
            assert!(res.hit());
            assert_abs_diff_eq!(dist - radius, res.distance, epsilon = config.surf_dist);
        }
    }

    #[test]
    fn test_hit_along_diagonal() {
        let config = MarchConfig::default();
        let from = Point3::new(3., -2., 1.);
        let ray = Ray::new(from, Unit::new_normalize(-from.coords));
        let res = march(&config, &unit_sphere(1.0), ray);
        assert!(res.hit());
        assert_abs_diff_eq!(from.coords.norm() - 1.0, res.distance, epsilon = config.surf_dist);
    }

    #[test]
    fn test_escape() {
        let config = MarchConfig::default();
        let ray = Ray::new(Point3::new(0., 0., 4.), Vector3::z_axis());
        let res = march(&config, &unit_sphere(0.5), ray);
        assert!(!res.hit());
        assert_eq!(Outcome::Escaped, res.outcome);
        assert_eq!(config.max_dist, res.distance);
    }

    #[test]
    fn test_grazing_ray_exhausts_budget() {
        // A ray skimming a sphere just outside `surf_dist` creeps along in ever smaller steps.
        let config = MarchConfig {
            max_steps: 5,
            ..MarchConfig::default()
        };
        let ray = Ray::new(Point3::new(-10., 1.002, 0.), Vector3::x_axis());
        let res = march(&config, &unit_sphere(1.0), ray);
        assert_eq!(Outcome::Exhausted, res.outcome);
        assert!(!res.hit());
        assert_eq!(config.max_steps, res.steps);
    }

    #[test]
    fn test_budgets_respected() {
        let config = MarchConfig {
            max_steps: 40,
            ..MarchConfig::default()
        };
        let field = Scene::default().field(0.3);

        for i in -10..=10 {
            for j in -10..=10 {
                let origin = Point3::new(i as f32 * 0.05, j as f32 * 0.05, 4.);
                let dir = Unit::new_normalize(Vector3::new(i as f32 * 0.01, 0.02, -1.));
                let res = march(&config, &field, Ray::new(origin, dir));
                assert!(res.steps <= config.max_steps);
                assert!(res.distance >= 0.);
                assert!(res.distance <= config.max_dist + config.surf_dist);
            }
        }
    }

    #[test]
    fn test_starting_inside() {
        let config = MarchConfig::default();
        let scene = Scene::empty(0.5).with_primitive(Primitive::sphere(Point3::origin(), 1.0));
        let ray = Ray::new(Point3::origin(), Vector3::x_axis());
        let res = march(&config, &scene.field(0.), ray);
        assert!(res.hit());
        assert_eq!(0., res.distance);
        assert_eq!(1, res.steps);
    }
}
