//! Flux under a Gaussian weight matched to an upstream shape measurement.

use super::flags::{FlagDefinition, FlagSet};
use super::record::{FluxResult, MeasurementOutput, MeasurementPath, SourceRecord};
use super::FluxAlgorithm;
use crate::config::{AlgorithmConfig, GaussianFluxConfig};
use crate::error::{ConfigError, MeasurementError};
use crate::image_proc::exposure::Exposure;
use crate::image_proc::gaussian::compute_fixed_moments_flux;
use crate::image_proc::mask::MaskPixel;

pub const NO_GOOD_PIXELS: usize = 1;
pub const EDGE: usize = 2;
pub const NO_CENTROID: usize = 3;
pub const NO_SHAPE: usize = 4;

pub const GAUSSIAN_FLAG_DEFINITIONS: &[FlagDefinition] = &[
    FlagDefinition::new("failed", "general failure flag, set if anything went wrong"),
    FlagDefinition::new("noGoodPixels", "no usable pixels under the weight"),
    FlagDefinition::new("edge", "weight region extended past the image"),
    FlagDefinition::new("noCentroid", "centroid missing or flagged"),
    FlagDefinition::new("noShape", "shape missing, flagged or not positive-definite"),
];

#[derive(Debug, Clone)]
pub struct GaussianFluxAlgorithm {
    name: String,
    config: GaussianFluxConfig,
    bad_mask: MaskPixel,
}

impl GaussianFluxAlgorithm {
    pub const DEFAULT_NAME: &'static str = "gaussian_flux";

    pub fn new(config: GaussianFluxConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bad_mask = config.bad_mask()?;
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            config,
            bad_mask,
        })
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl FluxAlgorithm for GaussianFluxAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    fn flag_definitions(&self) -> &'static [FlagDefinition] {
        GAUSSIAN_FLAG_DEFINITIONS
    }

    fn measure(&self, record: &mut SourceRecord, exposure: &Exposure) -> Result<(), MeasurementError> {
        let center = record.usable_centroid()?;
        let shape = record.usable_shape()?;
        let sum = compute_fixed_moments_flux(
            exposure,
            center,
            &shape,
            self.bad_mask,
            self.config.truncation_sigma,
        )?;

        let mut flags = FlagSet::empty();
        flags.set_if(EDGE, sum.edge);
        let result = FluxResult::new(sum.flux, sum.sigma(), flags, MeasurementPath::Gaussian);
        record.set_output(&self.name, MeasurementOutput::Flux(result));
        Ok(())
    }

    fn fail(&self, record: &mut SourceRecord, error: &MeasurementError) {
        let mut result = FluxResult::failure();
        match error {
            MeasurementError::NoGoodPixels => result.flags.set(NO_GOOD_PIXELS),
            MeasurementError::NoCentroid => result.flags.set(NO_CENTROID),
            MeasurementError::NoShape(_) => result.flags.set(NO_SHAPE),
            MeasurementError::NoPixels { .. } => result.flags.set(EDGE),
            MeasurementError::DimensionMismatch { .. } => {}
        }
        record.set_output(&self.name, MeasurementOutput::Flux(result));
    }
}
