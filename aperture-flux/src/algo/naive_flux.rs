//! Single circular aperture summed over whole pixels.

use super::aperture::compute_naive_flux;
use super::flags::{FlagDefinition, APERTURE_FLAG_DEFINITIONS};
use super::record::{FluxResult, MeasurementOutput, SourceRecord};
use super::FluxAlgorithm;
use crate::config::{AlgorithmConfig, NaiveFluxConfig};
use crate::error::{ConfigError, MeasurementError};
use crate::image_proc::exposure::Exposure;
use crate::image_proc::geometry::Aperture;
use crate::image_proc::mask::MaskPixel;

#[derive(Debug, Clone)]
pub struct NaiveFluxAlgorithm {
    name: String,
    config: NaiveFluxConfig,
    bad_mask: MaskPixel,
}

impl NaiveFluxAlgorithm {
    pub const DEFAULT_NAME: &'static str = "naive_flux";

    pub fn new(config: NaiveFluxConfig) -> Result<Self, ConfigError> {
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

impl FluxAlgorithm for NaiveFluxAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    fn flag_definitions(&self) -> &'static [FlagDefinition] {
        APERTURE_FLAG_DEFINITIONS
    }

    fn measure(&self, record: &mut SourceRecord, exposure: &Exposure) -> Result<(), MeasurementError> {
        let aperture = Aperture::circle(record.usable_centroid()?, self.config.radius);
        let result = compute_naive_flux(exposure, &aperture, self.bad_mask)?;
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
    use crate::algo::flags::{APERTURE_TRUNCATED, FAILURE};
    use crate::image_proc::geometry::Point2;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_measures_at_centroid() {
        let algo = NaiveFluxAlgorithm::new(NaiveFluxConfig {
            radius: 5.0,
            ..Default::default()
        })
        .unwrap();
        let exposure = Exposure::new(Array2::from_elem((21, 21), 100.0))
            .with_variance(Array2::from_elem((21, 21), 4.0))
            .unwrap();
        let mut record = SourceRecord::new(1, Point2::new(10.0, 10.0));
        algo.measure(&mut record, &exposure).unwrap();

        let result = record.flux(NaiveFluxAlgorithm::DEFAULT_NAME).unwrap();
        assert_relative_eq!(result.flux, 8100.0);
        assert_relative_eq!(result.flux_sigma, 18.0);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_fail_marks_off_image() {
        let algo = NaiveFluxAlgorithm::new(NaiveFluxConfig::default()).unwrap().named("naive");
        let exposure = Exposure::new(Array2::zeros((10, 10)));
        let mut record = SourceRecord::new(2, Point2::new(-40.0, 5.0));

        let err = algo.measure(&mut record, &exposure).unwrap_err();
        algo.fail(&mut record, &err);
        let result = record.flux("naive").unwrap();
        assert!(result.flags.get(FAILURE));
        assert!(result.flags.get(APERTURE_TRUNCATED));
    }
}
