//! Control structures for the flux algorithms.
//!
//! Every config serialises with camelCase field names, has a `Default` that
//! is a usable configuration, and is checked by [`AlgorithmConfig::validate`]
//! before an algorithm is built from it. Algorithms never see an invalid
//! config, so measurement code does not re-check these values.

use flux_math::ShiftKernel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::image_proc::geometry::{Aperture, EllipseAxes, Point2};
use crate::image_proc::mask::{plane_bitmask, MaskPixel};

fn default_bad_mask_planes() -> Vec<String> {
    ["BAD", "SAT", "NO_DATA"].map(String::from).to_vec()
}

/// Smallest outer radius, in pixels, any aperture config accepts.
///
/// Real-space sinc synthesis resolves boundaries down to this radius; below
/// it an aperture covers too little of a pixel to measure.
pub const MIN_APERTURE_RADIUS: f64 = 0.25;

fn check_radius(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= MIN_APERTURE_RADIUS {
        Ok(())
    } else {
        Err(ConfigError::InvalidRadius { field, value })
    }
}

fn check_ellipticity(value: f64) -> Result<(), ConfigError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidEllipticity(value))
    }
}

fn check_angle(value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidAngle(value))
    }
}

/// Validation and JSON loading shared by every control structure.
pub trait AlgorithmConfig: DeserializeOwned {
    fn validate(&self) -> Result<(), ConfigError>;

    /// Parse and validate a JSON document. Missing fields take their defaults.
    fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Multi-radius aperture photometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApertureFluxConfig {
    /// Semi-major radii of the apertures, in pixels
    pub radii: Vec<f64>,
    /// Apertures whose semi-minor axis is at most this use the sinc integrator
    pub max_sinc_radius: f64,
    /// Kernel that shifts sinc coefficients to the source centre
    pub shift_kernel: ShiftKernel,
    /// Mask planes whose pixels the naive integrator skips
    pub bad_mask_planes: Vec<String>,
    /// Ellipticity (1 - b/a) shared by every aperture
    pub ellipticity: f64,
    /// Position angle shared by every aperture, radians
    pub angle: f64,
}

impl Default for ApertureFluxConfig {
    fn default() -> Self {
        Self {
            radii: vec![3.0, 4.5, 6.0, 9.0, 12.0, 17.0, 25.0, 35.0, 50.0, 70.0],
            max_sinc_radius: 10.0,
            shift_kernel: ShiftKernel::default(),
            bad_mask_planes: default_bad_mask_planes(),
            ellipticity: 0.0,
            angle: 0.0,
        }
    }
}

impl ApertureFluxConfig {
    /// Set the shift kernel from its configuration name.
    pub fn with_shift_kernel(mut self, name: &str) -> Result<Self, ConfigError> {
        self.shift_kernel = name.parse()?;
        Ok(self)
    }

    pub fn bad_mask(&self) -> Result<MaskPixel, ConfigError> {
        plane_bitmask(&self.bad_mask_planes)
    }

    /// Axes of the aperture of semi-major `radius`.
    pub fn axes(&self, radius: f64) -> EllipseAxes {
        EllipseAxes::from_ellipticity(radius, self.ellipticity, self.angle)
    }
}

impl AlgorithmConfig for ApertureFluxConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for &radius in &self.radii {
            check_radius("radii", radius)?;
        }
        if !(self.max_sinc_radius.is_finite() && self.max_sinc_radius >= 0.0) {
            return Err(ConfigError::InvalidMaxSincRadius(self.max_sinc_radius));
        }
        check_ellipticity(self.ellipticity)?;
        check_angle(self.angle)?;
        self.bad_mask()?;
        Ok(())
    }
}

/// Single circular aperture summed over whole pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NaiveFluxConfig {
    pub radius: f64,
    pub bad_mask_planes: Vec<String>,
}

impl Default for NaiveFluxConfig {
    fn default() -> Self {
        Self {
            radius: 7.0,
            bad_mask_planes: default_bad_mask_planes(),
        }
    }
}

impl NaiveFluxConfig {
    pub fn bad_mask(&self) -> Result<MaskPixel, ConfigError> {
        plane_bitmask(&self.bad_mask_planes)
    }
}

impl AlgorithmConfig for NaiveFluxConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_radius("radius", self.radius)?;
        self.bad_mask()?;
        Ok(())
    }
}

/// Single sinc aperture, optionally annular and elliptical.
///
/// The outer boundary has semi-major `radius2` and semi-minor
/// `radius2 * (1 - ellipticity)`; the hole has the same shape scaled to
/// semi-major `radius1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SincFluxConfig {
    /// Inner semi-major radius, zero for a filled aperture
    pub radius1: f64,
    /// Outer semi-major radius
    pub radius2: f64,
    pub angle: f64,
    pub ellipticity: f64,
    pub shift_kernel: ShiftKernel,
}

impl Default for SincFluxConfig {
    fn default() -> Self {
        Self {
            radius1: 0.0,
            radius2: 7.0,
            angle: 0.0,
            ellipticity: 0.0,
            shift_kernel: ShiftKernel::default(),
        }
    }
}

impl SincFluxConfig {
    pub fn with_shift_kernel(mut self, name: &str) -> Result<Self, ConfigError> {
        self.shift_kernel = name.parse()?;
        Ok(self)
    }

    /// The configured aperture placed at `center`.
    pub fn aperture(&self, center: Point2) -> Aperture {
        let axes = EllipseAxes::from_ellipticity(self.radius2, self.ellipticity, self.angle);
        Aperture::annulus(center, axes, self.radius1 / self.radius2)
    }
}

impl AlgorithmConfig for SincFluxConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_radius("radius2", self.radius2)?;
        if !(self.radius1.is_finite() && self.radius1 >= 0.0) {
            return Err(ConfigError::InvalidRadius {
                field: "radius1",
                value: self.radius1,
            });
        }
        if self.radius1 >= self.radius2 {
            return Err(ConfigError::InvertedRadii {
                inner: self.radius1,
                outer: self.radius2,
            });
        }
        check_ellipticity(self.ellipticity)?;
        check_angle(self.angle)?;
        Ok(())
    }
}

/// Gaussian-weighted flux with an externally measured shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GaussianFluxConfig {
    pub bad_mask_planes: Vec<String>,
    /// Weight is zero beyond this many sigma of the shape ellipse
    pub truncation_sigma: f64,
}

impl Default for GaussianFluxConfig {
    fn default() -> Self {
        Self {
            bad_mask_planes: default_bad_mask_planes(),
            truncation_sigma: 4.0,
        }
    }
}

impl GaussianFluxConfig {
    pub fn bad_mask(&self) -> Result<MaskPixel, ConfigError> {
        plane_bitmask(&self.bad_mask_planes)
    }
}

impl AlgorithmConfig for GaussianFluxConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.truncation_sigma.is_finite() && self.truncation_sigma > 0.0) {
            return Err(ConfigError::InvalidTruncation(self.truncation_sigma));
        }
        self.bad_mask()?;
        Ok(())
    }
}
