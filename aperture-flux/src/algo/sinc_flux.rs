//! Single sinc aperture, optionally annular and elliptical.

use flux_math::FuzzyCompare;
use log::debug;
use std::sync::Arc;

use super::aperture::compute_sinc_flux;
use super::flags::{FlagDefinition, APERTURE_FLAG_DEFINITIONS};
use super::record::{FluxResult, MeasurementOutput, SourceRecord};
use super::FluxAlgorithm;
use crate::config::{AlgorithmConfig, SincFluxConfig};
use crate::error::{ConfigError, MeasurementError};
use crate::image_proc::exposure::Exposure;
use crate::image_proc::sinc::{SincCoeffCache, SincKey};

#[derive(Debug)]
pub struct SincFluxAlgorithm {
    name: String,
    config: SincFluxConfig,
    cache: Arc<SincCoeffCache>,
}

impl SincFluxAlgorithm {
    pub const DEFAULT_NAME: &'static str = "sinc_flux";

    pub fn new(config: SincFluxConfig) -> Result<Self, ConfigError> {
        Self::with_cache(config, SincCoeffCache::global())
    }

    /// Validate `config`; circular apertures have their coefficients built
    /// immediately since every source will share them.
    pub fn with_cache(config: SincFluxConfig, cache: Arc<SincCoeffCache>) -> Result<Self, ConfigError> {
        config.validate()?;
        if FuzzyCompare::default().is_equal(config.ellipticity, 0.0) {
            let key = SincKey::new(config.radius2, config.radius1 / config.radius2, 0.0, 0.0);
            debug!("Prewarming sinc coefficients for {key}");
            cache.prewarm(key);
        }
        Ok(Self {
            name: Self::DEFAULT_NAME.to_string(),
            config,
            cache,
        })
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl FluxAlgorithm for SincFluxAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    fn flag_definitions(&self) -> &'static [FlagDefinition] {
        APERTURE_FLAG_DEFINITIONS
    }

    fn measure(&self, record: &mut SourceRecord, exposure: &Exposure) -> Result<(), MeasurementError> {
        let aperture = self.config.aperture(record.usable_centroid()?);
        let result = compute_sinc_flux(exposure, &aperture, &self.cache, self.config.shift_kernel)?;
        record.set_output(&self.name, MeasurementOutput::Flux(result));
        Ok(())
    }

    fn fail(&self, record: &mut SourceRecord, error: &MeasurementError) {
        record.set_output(&self.name, MeasurementOutput::Flux(FluxResult::from_error(error)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::geometry::Point2;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use std::f64::consts::PI;

    #[test]
    fn test_circular_config_prewarms() {
        let cache = Arc::new(SincCoeffCache::new());
        let config = SincFluxConfig {
            radius2: 4.0,
            ..Default::default()
        };
        let _algo = SincFluxAlgorithm::with_cache(config, Arc::clone(&cache)).unwrap();
        assert_eq!(cache.synthesis_count(), 1);

        let elliptical = SincFluxConfig {
            radius2: 4.0,
            ellipticity: 0.3,
            ..Default::default()
        };
        let _algo = SincFluxAlgorithm::with_cache(elliptical, Arc::clone(&cache)).unwrap();
        assert_eq!(cache.synthesis_count(), 1);
    }

    #[test]
    fn test_annulus_flux() {
        let cache = Arc::new(SincCoeffCache::new());
        let config = SincFluxConfig {
            radius1: 3.0,
            radius2: 6.0,
            ..Default::default()
        };
        let algo = SincFluxAlgorithm::with_cache(config, Arc::clone(&cache)).unwrap();
        let exposure = Exposure::new(Array2::from_elem((40, 40), 10.0));
        let mut record = SourceRecord::new(1, Point2::new(20.3, 19.6));
        algo.measure(&mut record, &exposure).unwrap();

        let result = record.flux(SincFluxAlgorithm::DEFAULT_NAME).unwrap();
        assert_relative_eq!(result.flux, 10.0 * PI * (36.0 - 9.0), max_relative = 0.01);
        assert!(result.flux_sigma.is_nan());
        // The prewarmed entry is the one measured with.
        assert_eq!(cache.synthesis_count(), 1);
    }
}
