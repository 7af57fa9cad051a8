//! Per-source inputs and outputs of the flux algorithms.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::flags::{FlagSet, APERTURE_TRUNCATED, FAILURE};
use crate::error::MeasurementError;
use crate::image_proc::geometry::{Point2, Quadrupole};

/// Integrator a flux came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementPath {
    Naive,
    Sinc,
    Gaussian,
}

/// One flux measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxResult {
    pub flux: f64,
    /// NaN when there is no variance plane or the measurement failed
    pub flux_sigma: f64,
    pub flags: FlagSet,
    /// None when the measurement failed before an integrator ran
    pub path: Option<MeasurementPath>,
}

impl FluxResult {
    pub fn new(flux: f64, flux_sigma: f64, flags: FlagSet, path: MeasurementPath) -> Self {
        Self {
            flux,
            flux_sigma,
            flags,
            path: Some(path),
        }
    }

    /// NaN flux and sigma with the failure flag set.
    pub fn failure() -> Self {
        Self {
            flux: f64::NAN,
            flux_sigma: f64::NAN,
            flags: FlagSet::empty().with(FAILURE),
            path: None,
        }
    }

    /// Failure result for an aperture-style measurement ending in `error`.
    ///
    /// An empty aperture is flagged truncated only if it overhung the image.
    pub fn from_error(error: &MeasurementError) -> Self {
        let mut result = Self::failure();
        result.flags.set_if(
            APERTURE_TRUNCATED,
            matches!(error, MeasurementError::NoPixels { truncated: true, .. }),
        );
        result
    }

    pub fn failed(&self) -> bool {
        self.flags.get(FAILURE)
    }
}

/// Results of every configured radius of one source.
#[derive(Debug, Clone, PartialEq)]
pub struct ApertureFluxOutput {
    pub radii: Vec<f64>,
    /// One entry per radius, in configuration order
    pub results: Vec<FluxResult>,
    /// Aggregate over `results`
    pub flags: FlagSet,
}

impl ApertureFluxOutput {
    pub fn result(&self, radius_index: usize) -> Option<&FluxResult> {
        self.results.get(radius_index)
    }

    pub fn fluxes(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.flux).collect()
    }
}

/// Output slot written by one algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementOutput {
    Flux(FluxResult),
    Apertures(ApertureFluxOutput),
}

/// A detected source: upstream measurements in, flux outputs out.
///
/// Each record is written by exactly one worker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceRecord {
    pub id: u64,
    pub centroid: Option<Point2>,
    /// Set when the upstream centroider flagged its result
    pub centroid_flag: bool,
    pub shape: Option<Quadrupole>,
    /// Set when the upstream shape measurement flagged its result
    pub shape_flag: bool,
    outputs: BTreeMap<String, MeasurementOutput>,
}

impl SourceRecord {
    pub fn new(id: u64, centroid: Point2) -> Self {
        Self {
            id,
            centroid: Some(centroid),
            ..Default::default()
        }
    }

    pub fn with_shape(mut self, shape: Quadrupole) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Centroid if present, unflagged and finite.
    pub fn usable_centroid(&self) -> Result<Point2, MeasurementError> {
        match self.centroid {
            Some(centroid) if !self.centroid_flag && centroid.is_finite() => Ok(centroid),
            _ => Err(MeasurementError::NoCentroid),
        }
    }

    /// Shape if present and unflagged.
    pub fn usable_shape(&self) -> Result<Quadrupole, MeasurementError> {
        match (self.shape, self.shape_flag) {
            (None, _) => Err(MeasurementError::NoShape("record has no shape".to_string())),
            (Some(_), true) => Err(MeasurementError::NoShape("shape is flagged".to_string())),
            (Some(shape), false) => Ok(shape),
        }
    }

    pub fn set_output(&mut self, name: &str, output: MeasurementOutput) {
        self.outputs.insert(name.to_string(), output);
    }

    pub fn output(&self, name: &str) -> Option<&MeasurementOutput> {
        self.outputs.get(name)
    }

    /// Single flux written under `name`.
    pub fn flux(&self, name: &str) -> Option<&FluxResult> {
        match self.outputs.get(name) {
            Some(MeasurementOutput::Flux(result)) => Some(result),
            _ => None,
        }
    }

    /// Multi-radius output written under `name`.
    pub fn apertures(&self, name: &str) -> Option<&ApertureFluxOutput> {
        match self.outputs.get(name) {
            Some(MeasurementOutput::Apertures(output)) => Some(output),
            _ => None,
        }
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &MeasurementOutput)> {
        self.outputs.iter().map(|(name, output)| (name.as_str(), output))
    }
}
