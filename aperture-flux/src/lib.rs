//! aperture-flux - Aperture photometry of sources on calibrated images
//!
//! Measures the flux inside circular, elliptical and annular apertures,
//! together with its uncertainty propagated from a variance plane and flags
//! describing anything that degraded the measurement.
//!
//! # Layers
//!
//! - [`image_proc`] - exposures, aperture geometry and the integrators
//!   themselves: naive whole-pixel sums, sinc coefficient images (with their
//!   shared cache) and Gaussian-weighted sums
//! - [`algo`] - the [`algo::FluxAlgorithm`] implementations that read source
//!   records and write flux outputs, and the parallel [`algo::MeasurementTask`]
//! - [`config`] - validated, JSON-loadable control structures
//!
//! # Example
//!
//! ```
//! use aperture_flux::algo::{ApertureFluxAlgorithm, FluxAlgorithm, SourceRecord};
//! use aperture_flux::config::ApertureFluxConfig;
//! use aperture_flux::image_proc::{Exposure, Point2};
//! use ndarray::Array2;
//!
//! let exposure = Exposure::new(Array2::from_elem((21, 21), 100.0))
//!     .with_variance(Array2::from_elem((21, 21), 4.0))
//!     .unwrap();
//! let config = ApertureFluxConfig {
//!     radii: vec![5.0],
//!     max_sinc_radius: 3.0,
//!     ..Default::default()
//! };
//! let algorithm = ApertureFluxAlgorithm::new(config).unwrap();
//!
//! let mut record = SourceRecord::new(0, Point2::new(10.0, 10.0));
//! algorithm.measure(&mut record, &exposure).unwrap();
//!
//! let result = record.apertures(algorithm.name()).unwrap().results[0];
//! assert_eq!(result.flux, 8100.0);
//! assert_eq!(result.flux_sigma, 18.0);
//! ```

pub mod algo;
pub mod config;
pub mod error;
pub mod image_proc;

pub use algo::{FluxAlgorithm, FluxResult, MeasurementTask, SourceRecord};
pub use config::AlgorithmConfig;
pub use error::{ConfigError, MeasurementError};
