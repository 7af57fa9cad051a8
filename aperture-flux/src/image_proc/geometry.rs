//! Aperture geometry: points, ellipses, quadrupoles, pixel boxes and clipping.
//!
//! Coordinates follow the image planes: `x` is the column, `y` the row, and
//! pixel centres sit on integer coordinates. Angles are radians measured from
//! the +x axis towards +y.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::MeasurementError;

/// Sub-pixel position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned pixel box with inclusive, signed bounds.
///
/// Signed so that boxes around apertures hanging off the image can be
/// represented before they are clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelBox {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl PixelBox {
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Box covering a `width` x `height` image.
    pub fn from_shape(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i64 - 1, height as i64 - 1)
    }

    /// Square box of half-width `half` around an integer centre.
    pub fn centered(x: i64, y: i64, half: i64) -> Self {
        Self::new(x - half, y - half, x + half, y + half)
    }

    /// True when the box holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_x - self.min_x + 1) as usize
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_y - self.min_y + 1) as usize
        }
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Check if this box completely contains another
    pub fn contains(&self, other: &Self) -> bool {
        other.is_empty()
            || (self.min_x <= other.min_x
                && self.max_x >= other.max_x
                && self.min_y <= other.min_y
                && self.max_y >= other.max_y)
    }

    pub fn contains_pixel(&self, x: i64, y: i64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Overlap of two boxes; empty when they are disjoint.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }

    /// Box grown by `margin` pixels on every side.
    pub fn grown(&self, margin: i64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Iterate (x, y) over every pixel, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y).flat_map(move |y| (min_x..=max_x).map(move |x| (x, y)))
    }
}

/// Semi-axes and position angle of an ellipse.
///
/// Invariant: `a >= b >= 0`, `theta` in [0, pi).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseAxes {
    /// Semi-major axis
    pub a: f64,
    /// Semi-minor axis
    pub b: f64,
    /// Position angle of the major axis
    pub theta: f64,
}

impl EllipseAxes {
    /// Build axes, reordering so that `a >= b` and reducing the angle mod pi.
    pub fn new(a: f64, b: f64, theta: f64) -> Self {
        let (a, b) = (a.abs(), b.abs());
        let (a, b, theta) = if b > a {
            (b, a, theta + PI / 2.0)
        } else {
            (a, b, theta)
        };
        Self {
            a,
            b,
            theta: theta.rem_euclid(PI),
        }
    }

    pub fn circle(radius: f64) -> Self {
        Self::new(radius, radius, 0.0)
    }

    /// Axes with semi-major `radius` and semi-minor `radius * (1 - ellipticity)`.
    pub fn from_ellipticity(radius: f64, ellipticity: f64, theta: f64) -> Self {
        Self::new(radius, radius * (1.0 - ellipticity), theta)
    }

    /// 1 - b/a, zero for a circle.
    pub fn ellipticity(&self) -> f64 {
        if self.a > 0.0 {
            1.0 - self.b / self.a
        } else {
            0.0
        }
    }

    pub fn area(&self) -> f64 {
        PI * self.a * self.b
    }

    /// Same shape with both axes multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            a: self.a * factor,
            b: self.b * factor,
            theta: self.theta,
        }
    }

    /// Half-widths (x, y) of the axis-aligned box enclosing the ellipse.
    pub fn half_extents(&self) -> (f64, f64) {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let (a2, b2) = (self.a * self.a, self.b * self.b);
        (
            (a2 * cos_t * cos_t + b2 * sin_t * sin_t).sqrt(),
            (a2 * sin_t * sin_t + b2 * cos_t * cos_t).sqrt(),
        )
    }

    /// Ellipse membership of an offset from the centre.
    #[inline]
    pub fn contains(&self, dx: f64, dy: f64) -> bool {
        if self.b <= 0.0 {
            return false;
        }
        let (sin_t, cos_t) = self.theta.sin_cos();
        let u = (dx * cos_t + dy * sin_t) / self.a;
        let v = (-dx * sin_t + dy * cos_t) / self.b;
        u * u + v * v <= 1.0
    }

    pub fn to_quadrupole(&self) -> Quadrupole {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let (a2, b2) = (self.a * self.a, self.b * self.b);
        Quadrupole {
            ixx: a2 * cos_t * cos_t + b2 * sin_t * sin_t,
            iyy: a2 * sin_t * sin_t + b2 * cos_t * cos_t,
            ixy: (a2 - b2) * sin_t * cos_t,
        }
    }
}

/// Second moments of a shape, the covariance of an elliptical Gaussian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrupole {
    pub ixx: f64,
    pub iyy: f64,
    pub ixy: f64,
}

impl Quadrupole {
    pub fn new(ixx: f64, iyy: f64, ixy: f64) -> Self {
        Self { ixx, iyy, ixy }
    }

    pub fn determinant(&self) -> f64 {
        self.ixx * self.iyy - self.ixy * self.ixy
    }

    pub fn is_positive_definite(&self) -> bool {
        self.ixx.is_finite()
            && self.iyy.is_finite()
            && self.ixy.is_finite()
            && self.ixx > 0.0
            && self.determinant() > 0.0
    }

    /// Inverse matrix as (xx, yy, xy), or None when not positive-definite.
    pub fn inverse(&self) -> Option<(f64, f64, f64)> {
        if !self.is_positive_definite() {
            return None;
        }
        let det = self.determinant();
        Some((self.iyy / det, self.ixx / det, -self.ixy / det))
    }

    /// One-sigma ellipse of the moments.
    pub fn to_axes(&self) -> EllipseAxes {
        let sum = self.ixx + self.iyy;
        let diff = self.ixx - self.iyy;
        let discriminant = (diff * diff + 4.0 * self.ixy * self.ixy).sqrt();
        let lambda1 = 0.5 * (sum + discriminant);
        let lambda2 = (0.5 * (sum - discriminant)).max(0.0);
        let theta = 0.5 * (2.0 * self.ixy).atan2(diff);
        EllipseAxes::new(lambda1.sqrt(), lambda2.sqrt(), theta)
    }
}

/// A measurement region: an ellipse around a centre, optionally with an
/// elliptical hole of the same shape scaled by `inner_ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aperture {
    pub center: Point2,
    pub axes: EllipseAxes,
    /// Inner/outer radius ratio in [0, 1); zero for a filled aperture
    pub inner_ratio: f64,
}

impl Aperture {
    pub fn new(center: Point2, axes: EllipseAxes) -> Self {
        Self {
            center,
            axes,
            inner_ratio: 0.0,
        }
    }

    pub fn circle(center: Point2, radius: f64) -> Self {
        Self::new(center, EllipseAxes::circle(radius))
    }

    pub fn annulus(center: Point2, axes: EllipseAxes, inner_ratio: f64) -> Self {
        Self {
            center,
            axes,
            inner_ratio,
        }
    }

    /// Area enclosed between the inner and outer boundaries.
    pub fn area(&self) -> f64 {
        self.axes.area() * (1.0 - self.inner_ratio * self.inner_ratio)
    }

    /// Membership of an image position.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.center.x;
        let dy = y - self.center.y;
        self.axes.contains(dx, dy)
            && !(self.inner_ratio > 0.0 && self.axes.scaled(self.inner_ratio).contains(dx, dy))
    }

    /// Smallest box holding every pixel whose centre may lie inside.
    pub fn pixel_bbox(&self) -> PixelBox {
        let (ex, ey) = self.axes.half_extents();
        PixelBox::new(
            (self.center.x - ex).ceil() as i64,
            (self.center.y - ey).ceil() as i64,
            (self.center.x + ex).floor() as i64,
            (self.center.y + ey).floor() as i64,
        )
    }
}

/// An aperture together with the part of it that lies on the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedAperture {
    pub aperture: Aperture,
    /// Pixels to visit, already inside the image bounds
    pub region: PixelBox,
    /// The margin-expanded box extended past the image
    pub truncated: bool,
}

/// Clip an aperture against image bounds.
///
/// The aperture's pixel box is grown by `margin` pixels (room for kernel
/// support) before it is compared with `bounds`; any overhang sets
/// `truncated`, which is not an error. An aperture too small to hold a pixel
/// centre keeps the pixel nearest its centre.
///
/// # Errors
/// [`MeasurementError::NoPixels`] when nothing of the aperture is left, with
/// `truncated` set when that is because it lies off the image.
pub fn clip(
    aperture: &Aperture,
    bounds: &PixelBox,
    margin: i64,
) -> Result<ClippedAperture, MeasurementError> {
    let no_pixels = |truncated| MeasurementError::NoPixels {
        x: aperture.center.x,
        y: aperture.center.y,
        radius: aperture.axes.a,
        truncated,
    };
    if !(aperture.center.is_finite() && aperture.axes.a.is_finite()) {
        return Err(no_pixels(false));
    }

    let mut full = aperture.pixel_bbox();
    if full.is_empty() {
        let (x, y) = (aperture.center.x.round() as i64, aperture.center.y.round() as i64);
        full = PixelBox::new(x, y, x, y);
    }
    let region = full.intersection(bounds);
    if region.is_empty() {
        return Err(no_pixels(true));
    }

    Ok(ClippedAperture {
        aperture: *aperture,
        region,
        truncated: !bounds.contains(&full.grown(margin)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axes_normalised() {
        let axes = EllipseAxes::new(2.0, 5.0, 0.1);
        assert_eq!(axes.a, 5.0);
        assert_eq!(axes.b, 2.0);
        assert_relative_eq!(axes.theta, 0.1 + PI / 2.0);

        let wrapped = EllipseAxes::new(3.0, 1.0, -0.2);
        assert_relative_eq!(wrapped.theta, PI - 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_circle_membership() {
        let axes = EllipseAxes::circle(5.0);
        assert!(axes.contains(3.0, 4.0));
        assert!(axes.contains(5.0, 0.0));
        assert!(!axes.contains(3.0, 4.1));
    }

    #[test]
    fn test_rotated_ellipse_membership() {
        let axes = EllipseAxes::new(4.0, 1.0, PI / 2.0);
        assert!(axes.contains(0.0, 3.9));
        assert!(!axes.contains(3.9, 0.0));
        let (ex, ey) = axes.half_extents();
        assert_relative_eq!(ex, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ey, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quadrupole_round_trip() {
        let axes = EllipseAxes::new(3.0, 1.5, 0.6);
        let back = axes.to_quadrupole().to_axes();
        assert_relative_eq!(back.a, 3.0, epsilon = 1e-10);
        assert_relative_eq!(back.b, 1.5, epsilon = 1e-10);
        assert_relative_eq!(back.theta, 0.6, epsilon = 1e-10);
    }

    #[test]
    fn test_quadrupole_inverse() {
        let q = Quadrupole::new(4.0, 2.0, 1.0);
        let (xx, yy, xy) = q.inverse().unwrap();
        // Q * Q^-1 = I
        assert_relative_eq!(q.ixx * xx + q.ixy * xy, 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.ixx * xy + q.ixy * yy, 0.0, epsilon = 1e-12);
        assert!(Quadrupole::new(1.0, 1.0, 1.0).inverse().is_none());
        assert!(Quadrupole::new(-1.0, 1.0, 0.0).inverse().is_none());
    }

    #[test]
    fn test_pixel_box_ops() {
        let image = PixelBox::from_shape(21, 21);
        let inside = PixelBox::centered(10, 10, 5);
        assert!(image.contains(&inside));
        assert_eq!(inside.area(), 121);

        let overhang = PixelBox::centered(2, 10, 5);
        assert!(!image.contains(&overhang));
        let clipped = overhang.intersection(&image);
        assert_eq!(clipped.min_x, 0);
        assert_eq!(clipped.width(), 8);

        let disjoint = PixelBox::centered(40, 40, 2).intersection(&image);
        assert!(disjoint.is_empty());
        assert_eq!(disjoint.area(), 0);
        assert_eq!(PixelBox::centered(0, 0, 1).pixels().count(), 9);
    }

    #[test]
    fn test_annulus_membership() {
        let aperture = Aperture::annulus(Point2::new(0.0, 0.0), EllipseAxes::circle(4.0), 0.5);
        assert!(!aperture.contains(1.0, 0.0));
        assert!(aperture.contains(3.0, 0.0));
        assert!(!aperture.contains(4.5, 0.0));
        assert_relative_eq!(aperture.area(), PI * 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_inside_not_truncated() {
        let bounds = PixelBox::from_shape(21, 21);
        let aperture = Aperture::circle(Point2::new(10.0, 10.0), 5.0);
        let clipped = clip(&aperture, &bounds, 0).unwrap();
        assert!(!clipped.truncated);
        assert_eq!(clipped.region, PixelBox::new(5, 5, 15, 15));
    }

    #[test]
    fn test_clip_margin_causes_truncation() {
        let bounds = PixelBox::from_shape(21, 21);
        let aperture = Aperture::circle(Point2::new(10.0, 10.0), 5.0);
        assert!(!clip(&aperture, &bounds, 5).unwrap().truncated);
        assert!(clip(&aperture, &bounds, 6).unwrap().truncated);
    }

    #[test]
    fn test_clip_edge_and_outside() {
        let bounds = PixelBox::from_shape(21, 21);
        let edge = Aperture::circle(Point2::new(1.0, 10.0), 5.0);
        let clipped = clip(&edge, &bounds, 0).unwrap();
        assert!(clipped.truncated);
        assert_eq!(clipped.region.min_x, 0);

        let outside = Aperture::circle(Point2::new(-20.0, 10.0), 5.0);
        assert!(matches!(
            clip(&outside, &bounds, 0),
            Err(MeasurementError::NoPixels { truncated: true, .. })
        ));

        let nan = Aperture::circle(Point2::new(f64::NAN, 10.0), 5.0);
        assert!(matches!(
            clip(&nan, &bounds, 0),
            Err(MeasurementError::NoPixels { truncated: false, .. })
        ));
    }

    #[test]
    fn test_clip_between_centres_keeps_nearest_pixel() {
        let bounds = PixelBox::from_shape(41, 41);
        let tiny = Aperture::circle(Point2::new(20.4, 20.3), 0.2);
        assert!(tiny.pixel_bbox().is_empty());

        let clipped = clip(&tiny, &bounds, 0).unwrap();
        assert_eq!(clipped.region, PixelBox::new(20, 20, 20, 20));
        assert!(!clipped.truncated);
    }
}
