//! Canonical cache key for sinc coefficient images.
//!
//! The continuous aperture shape is mapped onto a fixed integer grid:
//!
//! | quantity                  | grid spacing |
//! |---------------------------|--------------|
//! | outer semi-major radius   | 1e-4 px      |
//! | inner/outer radius ratio  | 1e-4         |
//! | ellipticity (1 - b/a)     | 1e-4         |
//! | position angle (mod pi)   | 0.01 rad     |
//!
//! The angle is forced to zero when the quantised ellipticity is zero, since
//! a circle has no orientation. Coefficients are always synthesised from the
//! dequantised values, so every aperture mapping to one key shares one image.
//! The coarse angle grid costs at most 0.005 rad of orientation error on
//! elliptical apertures.

use flux_math::{dequantize, quantize};
use std::f64::consts::PI;
use std::fmt;

use crate::image_proc::geometry::{Aperture, EllipseAxes};

pub const RADIUS_QUANTUM: f64 = 1e-4;
pub const RATIO_QUANTUM: f64 = 1e-4;
pub const ELLIPTICITY_QUANTUM: f64 = 1e-4;
pub const ANGLE_QUANTUM: f64 = 0.01;

/// Quantised aperture shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SincKey {
    outer: i64,
    inner_ratio: i64,
    ellipticity: i64,
    angle: i64,
}

impl SincKey {
    /// Quantise a shape.
    ///
    /// # Arguments
    /// * `outer_radius` - Semi-major axis of the outer boundary
    /// * `inner_ratio` - Inner/outer radius ratio, zero for a filled aperture
    /// * `ellipticity` - 1 - b/a of the outer boundary
    /// * `angle` - Position angle of the major axis, radians
    pub fn new(outer_radius: f64, inner_ratio: f64, ellipticity: f64, angle: f64) -> Self {
        let ellipticity = quantize(ellipticity, ELLIPTICITY_QUANTUM);
        let angle = if ellipticity == 0 {
            0
        } else {
            let turns = (PI / ANGLE_QUANTUM).round() as i64;
            quantize(angle.rem_euclid(PI), ANGLE_QUANTUM).rem_euclid(turns)
        };
        Self {
            outer: quantize(outer_radius, RADIUS_QUANTUM),
            inner_ratio: quantize(inner_ratio, RATIO_QUANTUM),
            ellipticity,
            angle,
        }
    }

    /// Key of an aperture's shape; its centre does not take part.
    pub fn from_aperture(aperture: &Aperture) -> Self {
        Self::new(
            aperture.axes.a,
            aperture.inner_ratio,
            aperture.axes.ellipticity(),
            aperture.axes.theta,
        )
    }

    pub fn outer_radius(&self) -> f64 {
        dequantize(self.outer, RADIUS_QUANTUM)
    }

    pub fn inner_ratio(&self) -> f64 {
        dequantize(self.inner_ratio, RATIO_QUANTUM)
    }

    pub fn ellipticity(&self) -> f64 {
        dequantize(self.ellipticity, ELLIPTICITY_QUANTUM)
    }

    pub fn angle(&self) -> f64 {
        dequantize(self.angle, ANGLE_QUANTUM)
    }

    pub fn is_circular(&self) -> bool {
        self.ellipticity == 0
    }

    /// Outer boundary reconstructed from the grid values.
    pub fn axes(&self) -> EllipseAxes {
        EllipseAxes::from_ellipticity(self.outer_radius(), self.ellipticity(), self.angle())
    }
}

impl fmt::Display for SincKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r={:.4} inner={:.4} e={:.4} theta={:.2}",
            self.outer_radius(),
            self.inner_ratio(),
            self.ellipticity(),
            self.angle()
        )
    }
}
