//! Flux algorithms over source records, and the batch driver that runs them.

pub mod aperture;
pub mod flags;
pub mod gaussian_flux;
pub mod naive_flux;
pub mod record;
pub mod sinc_flux;
pub mod task;

use crate::error::MeasurementError;
use crate::image_proc::exposure::Exposure;

pub use aperture::{
    compute_naive_flux, compute_sinc_flux, select_path, ApertureFluxAlgorithm, ApertureIntegrator,
};
pub use flags::{FlagDefinition, FlagSet, APERTURE_FLAG_DEFINITIONS};
pub use gaussian_flux::{GaussianFluxAlgorithm, GAUSSIAN_FLAG_DEFINITIONS};
pub use naive_flux::NaiveFluxAlgorithm;
pub use record::{
    ApertureFluxOutput, FluxResult, MeasurementOutput, MeasurementPath, SourceRecord,
};
pub use sinc_flux::SincFluxAlgorithm;
pub use task::{MeasurementTask, TaskSummary};

/// A measurement applied to one source at a time.
///
/// Implementations hold only immutable configuration (and shared caches),
/// so one instance serves every worker.
pub trait FluxAlgorithm: Send + Sync {
    /// Key the algorithm writes its output under.
    fn name(&self) -> &str;

    fn flag_definitions(&self) -> &'static [FlagDefinition];

    /// Measure `record` on `exposure` and write the output.
    ///
    /// Conditions that still yield a number (truncation, a failed radius)
    /// are written as flags and return `Ok`.
    fn measure(&self, record: &mut SourceRecord, exposure: &Exposure) -> Result<(), MeasurementError>;

    /// Write a failed output for `record` describing `error`.
    fn fail(&self, record: &mut SourceRecord, error: &MeasurementError);
}
