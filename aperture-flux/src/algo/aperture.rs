//! Multi-radius aperture photometry with naive/sinc dispatch.
//!
//! Small apertures are measured with sinc coefficients, which weight partial
//! pixels correctly. Large apertures are measured naively: the boundary pixels
//! are a small fraction of the total and sinc coefficients for them are
//! costly to build.

use flux_math::ShiftKernel;
use log::debug;
use std::sync::Arc;

use super::flags::{
    FlagDefinition, FlagSet, APERTURE_FLAG_DEFINITIONS, APERTURE_TRUNCATED, FAILURE,
    SINC_COEFFS_TRUNCATED,
};
use super::record::{ApertureFluxOutput, FluxResult, MeasurementOutput, MeasurementPath, SourceRecord};
use super::FluxAlgorithm;
use crate::config::{AlgorithmConfig, ApertureFluxConfig};
use crate::error::{ConfigError, MeasurementError};
use crate::image_proc::exposure::Exposure;
use crate::image_proc::geometry::{Aperture, EllipseAxes};
use crate::image_proc::mask::MaskPixel;
use crate::image_proc::naive::integrate_naive;
use crate::image_proc::sinc::{integrate_sinc, SincCoeffCache};

/// Integrators an aperture can be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApertureIntegrator {
    Naive,
    Sinc,
}

impl From<ApertureIntegrator> for MeasurementPath {
    fn from(integrator: ApertureIntegrator) -> Self {
        match integrator {
            ApertureIntegrator::Naive => MeasurementPath::Naive,
            ApertureIntegrator::Sinc => MeasurementPath::Sinc,
        }
    }
}

/// Integrator for an aperture: sinc when the semi-minor axis is at most
/// `max_sinc_radius`, naive otherwise.
pub fn select_path(axes: &EllipseAxes, max_sinc_radius: f64) -> ApertureIntegrator {
    if axes.b <= max_sinc_radius {
        ApertureIntegrator::Sinc
    } else {
        ApertureIntegrator::Naive
    }
}

/// Naive flux of one aperture.
pub fn compute_naive_flux(
    exposure: &Exposure,
    aperture: &Aperture,
    bad_mask: MaskPixel,
) -> Result<FluxResult, MeasurementError> {
    let sum = integrate_naive(exposure, aperture, bad_mask)?;
    let mut flags = FlagSet::empty();
    flags.set_if(APERTURE_TRUNCATED, sum.truncated);
    Ok(FluxResult::new(sum.flux, sum.sigma(), flags, MeasurementPath::Naive))
}

/// Sinc flux of one aperture.
pub fn compute_sinc_flux(
    exposure: &Exposure,
    aperture: &Aperture,
    cache: &SincCoeffCache,
    kernel: ShiftKernel,
) -> Result<FluxResult, MeasurementError> {
    let sum = integrate_sinc(exposure, aperture, cache, kernel)?;
    let mut flags = FlagSet::empty();
    flags.set_if(APERTURE_TRUNCATED, sum.aperture_truncated);
    flags.set_if(SINC_COEFFS_TRUNCATED, sum.coeffs_truncated);
    Ok(FluxResult::new(sum.flux, sum.sigma(), flags, MeasurementPath::Sinc))
}

/// Flux, sigma and flags for every configured radius.
#[derive(Debug)]
pub struct ApertureFluxAlgorithm {
    name: String,
    config: ApertureFluxConfig,
    bad_mask: MaskPixel,
    cache: Arc<SincCoeffCache>,
}

impl ApertureFluxAlgorithm {
    pub const DEFAULT_NAME: &'static str = "aperture_flux";

    /// Validate `config` and share the process-wide coefficient cache.
    pub fn new(config: ApertureFluxConfig) -> Result<Self, ConfigError> {
        Self::with_cache(config, SincCoeffCache::global())
    }

    pub fn with_cache(
        config: ApertureFluxConfig,
        cache: Arc<SincCoeffCache>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let bad_mask = config.bad_mask()?;
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            config,
            bad_mask,
            cache,
        })
    }

    /// Write outputs under `name` instead of the default.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn config(&self) -> &ApertureFluxConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SincCoeffCache> {
        &self.cache
    }

    /// Measure one aperture on whichever path its size selects.
    pub fn compute_flux(
        &self,
        exposure: &Exposure,
        aperture: &Aperture,
    ) -> Result<FluxResult, MeasurementError> {
        match select_path(&aperture.axes, self.config.max_sinc_radius) {
            ApertureIntegrator::Sinc => {
                compute_sinc_flux(exposure, aperture, &self.cache, self.config.shift_kernel)
            }
            ApertureIntegrator::Naive => compute_naive_flux(exposure, aperture, self.bad_mask),
        }
    }

    fn failed_output(&self) -> ApertureFluxOutput {
        ApertureFluxOutput {
            radii: self.config.radii.clone(),
            results: vec![FluxResult::failure(); self.config.radii.len()],
            flags: FlagSet::empty().with(FAILURE),
        }
    }
}

impl FluxAlgorithm for ApertureFluxAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    fn flag_definitions(&self) -> &'static [FlagDefinition] {
        APERTURE_FLAG_DEFINITIONS
    }

    fn measure(&self, record: &mut SourceRecord, exposure: &Exposure) -> Result<(), MeasurementError> {
        let center = record.usable_centroid()?;

        let results: Vec<FluxResult> = self
            .config
            .radii
            .iter()
            .map(|&radius| {
                let aperture = Aperture::new(center, self.config.axes(radius));
                self.compute_flux(exposure, &aperture).unwrap_or_else(|err| {
                    debug!("Source {} radius {radius}: {err}", record.id);
                    FluxResult::from_error(&err)
                })
            })
            .collect();

        let mut flags = FlagSet::empty();
        for result in &results {
            flags.set_if(APERTURE_TRUNCATED, result.flags.get(APERTURE_TRUNCATED));
            flags.set_if(SINC_COEFFS_TRUNCATED, result.flags.get(SINC_COEFFS_TRUNCATED));
        }
        flags.set_if(FAILURE, !results.is_empty() && results.iter().all(FluxResult::failed));

        record.set_output(
            &self.name,
            MeasurementOutput::Apertures(ApertureFluxOutput {
                radii: self.config.radii.clone(),
                results,
                flags,
            }),
        );
        Ok(())
    }

    fn fail(&self, record: &mut SourceRecord, _error: &MeasurementError) {
        record.set_output(&self.name, MeasurementOutput::Apertures(self.failed_output()));
    }
}
