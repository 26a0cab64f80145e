use nalgebra::Vector3;

pub trait Mix {
    type Output;

    fn mix(self, b: Self, t: f32) -> Self::Output;
}

impl Mix for f32 {
    type Output = f32;

    #[inline]
    fn mix(self, y: f32, t: f32) -> f32 {
        self * (1.0 - t) + y * t
    }
}

impl Mix for &Vector3<f32> {
    type Output = Vector3<f32>;

    #[inline]
    fn mix(self, other: Self, t: f32) -> Self::Output {
        Vector3::new(
            self.x.mix(other.x, t),
            self.y.mix(other.y, t),
            self.z.mix(other.z, t),
        )
    }
}

/// Polynomial smooth minimum of two distances with blend radius `k`.
///
/// The result never exceeds `a.min(b)`, and for `k <= 0` it is exactly the hard minimum.
#[inline]
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }

    let h = (0.5 + 0.5 * (b - a) / k).clamp(0., 1.);
    f32::mix(b, a, h) - k * h * (1.0 - h)
}

#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    (deg / 180.) * std::f32::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_deg_to_rad() {
        assert_eq!(std::f32::consts::PI, deg_to_rad(180.));
    }

    #[test]
    fn test_mix() {
        assert_eq!(2.0, f32::mix(2.0, 4.0, 0.0));
        assert_eq!(4.0, f32::mix(2.0, 4.0, 1.0));
        assert_eq!(3.0, f32::mix(2.0, 4.0, 0.5));

        let v = Vector3::new(0., 2., 4.).mix(&Vector3::new(2., 2., 0.), 0.5);
        assert_eq!(Vector3::new(1., 2., 2.), v);
    }

    #[test]
    fn test_smooth_min_hard_limit() {
        let pairs: [(f32, f32); 4] = [(0.3, 0.7), (1.0, -1.0), (0.25, 0.25), (-2.0, 5.0)];
        for (a, b) in pairs {
            assert_eq!(a.min(b), smooth_min(a, b, 0.0));
            assert_abs_diff_eq!(a.min(b), smooth_min(a, b, 1e-5), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_smooth_min_never_overestimates() {
        for k in [0.01, 0.1, 0.5, 2.0] {
            for i in -20..=20 {
                let a = i as f32 * 0.1;
                for j in -20..=20 {
                    let b = j as f32 * 0.13;
                    assert!(
                        smooth_min(a, b, k) <= a.min(b) + 1e-6,
                        "smooth_min({}, {}, {}) exceeded min",
                        a,
                        b,
                        k
                    );
                }
            }
        }
    }

    #[test]
    fn test_smooth_min_far_apart() {
        // Distances further apart than the blend radius are not blended.
        assert_eq!(0.2, smooth_min(0.2, 5.0, 0.5));
        assert_eq!(0.2, smooth_min(5.0, 0.2, 0.5));

        // Equal distances are pulled down by a quarter of the blend radius.
        assert_abs_diff_eq!(1.0 - 0.125, smooth_min(1.0, 1.0, 0.5), epsilon = 1e-6);
    }
}
