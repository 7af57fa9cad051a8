//! Fourier transform of a uniform elliptical aperture.
//!
//! For a disk of radius `r` the transform of its indicator function is the
//! Airy amplitude profile
//!
//! ```text
//! A(k) = pi r^2 * 2 J1(k r) / (k r)
//! ```
//!
//! An ellipse with semi-axes `a`, `b` rotated by `theta` is the unit disk under
//! the affine map `x = R(theta) diag(a, b) u`, so its transform is the disk
//! profile evaluated at `rho = |diag(a, b) R(theta)^T k|` and scaled by the
//! Jacobian `a b`.

use scilib::math::bessel;
use std::f64::consts::PI;

/// Below this argument `2 J1(rho) / rho` is replaced by its limit of 1.
const SMALL_ARGUMENT: f64 = 1e-8;

/// Transform of the indicator of an ellipse centred on the origin.
///
/// # Arguments
/// * `a` - Semi-major axis in pixels
/// * `b` - Semi-minor axis in pixels
/// * `theta` - Position angle of the major axis, radians from +x
/// * `kx`, `ky` - Angular frequency in radians per pixel
///
/// # Returns
/// The real (the aperture is point-symmetric) transform value. Zero for a
/// degenerate ellipse.
pub fn uniform_ellipse_ft(a: f64, b: f64, theta: f64, kx: f64, ky: f64) -> f64 {
    if a <= 0.0 || b <= 0.0 {
        return 0.0;
    }

    let (sin_t, cos_t) = theta.sin_cos();
    let ku = kx * cos_t + ky * sin_t;
    let kv = -kx * sin_t + ky * cos_t;
    let rho = ((a * ku).powi(2) + (b * kv).powi(2)).sqrt();

    let area = PI * a * b;
    if rho < SMALL_ARGUMENT {
        return area;
    }

    let j1 = bessel::j_n(1, rho);
    area * 2.0 * j1 / rho
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_frequency_is_area() {
        assert_relative_eq!(uniform_ellipse_ft(5.0, 5.0, 0.0, 0.0, 0.0), PI * 25.0);
        assert_relative_eq!(uniform_ellipse_ft(4.0, 1.5, 0.7, 0.0, 0.0), PI * 6.0);
    }

    #[test]
    fn test_circle_first_zero() {
        // J1 has its first zero at 3.8317, so the disk transform vanishes there.
        let r = 2.0;
        let k = 3.831_705_97 / r;
        let value = uniform_ellipse_ft(r, r, 0.0, k, 0.0);
        assert!(value.abs() < 1e-5 * PI * r * r, "value = {value}");
    }

    #[test]
    fn test_circle_is_isotropic() {
        let along_x = uniform_ellipse_ft(3.0, 3.0, 0.0, 0.8, 0.0);
        let diagonal = uniform_ellipse_ft(3.0, 3.0, 0.0, 0.8 / 2f64.sqrt(), 0.8 / 2f64.sqrt());
        assert_relative_eq!(along_x, diagonal, epsilon = 1e-10);
    }

    #[test]
    fn test_rotation_swaps_axes() {
        // A quarter turn maps the major axis onto y.
        let unrotated = uniform_ellipse_ft(4.0, 2.0, 0.0, 0.0, 0.5);
        let rotated = uniform_ellipse_ft(4.0, 2.0, PI / 2.0, 0.5, 0.0);
        assert_relative_eq!(unrotated, rotated, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_ellipse() {
        assert_eq!(uniform_ellipse_ft(0.0, 0.0, 0.0, 0.1, 0.1), 0.0);
    }
}
