//! Batch driver running flux algorithms over many sources in parallel.

use log::{debug, info, warn};
use rayon::prelude::*;

use super::record::SourceRecord;
use super::FluxAlgorithm;
use crate::image_proc::exposure::Exposure;

/// Counts from one [`MeasurementTask::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub n_sources: usize,
    /// Failed measurements per algorithm, in registration order
    pub failures: Vec<(String, usize)>,
}

impl TaskSummary {
    pub fn total_failures(&self) -> usize {
        self.failures.iter().map(|(_, n)| n).sum()
    }
}

/// Ordered set of algorithms applied to every source record.
///
/// Sources are independent, so records are measured in parallel with one
/// worker per record; the exposure is shared read-only. A failing measurement
/// is converted into flags by its algorithm and never stops the batch.
#[derive(Default)]
pub struct MeasurementTask {
    algorithms: Vec<Box<dyn FluxAlgorithm>>,
}

impl MeasurementTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm<A: FluxAlgorithm + 'static>(mut self, algorithm: A) -> Self {
        self.add(Box::new(algorithm));
        self
    }

    pub fn add(&mut self, algorithm: Box<dyn FluxAlgorithm>) {
        self.algorithms.push(algorithm);
    }

    pub fn algorithm_names(&self) -> Vec<&str> {
        self.algorithms.iter().map(|a| a.name()).collect()
    }

    /// Run every algorithm on one record, returning which of them failed.
    pub fn measure_one(&self, record: &mut SourceRecord, exposure: &Exposure) -> Vec<bool> {
        self.algorithms
            .iter()
            .map(|algorithm| match algorithm.measure(record, exposure) {
                Ok(()) => false,
                Err(err) => {
                    debug!("{} failed on source {}: {err}", algorithm.name(), record.id);
                    algorithm.fail(record, &err);
                    true
                }
            })
            .collect()
    }

    /// Measure every record in parallel.
    pub fn run(&self, records: &mut [SourceRecord], exposure: &Exposure) -> TaskSummary {
        let failed: Vec<Vec<bool>> = records
            .par_iter_mut()
            .map(|record| self.measure_one(record, exposure))
            .collect();

        let failures: Vec<(String, usize)> = self
            .algorithms
            .iter()
            .enumerate()
            .map(|(index, algorithm)| {
                let count = failed.iter().filter(|per_source| per_source[index]).count();
                (algorithm.name().to_string(), count)
            })
            .collect();

        for (name, count) in &failures {
            if *count > 0 && *count == records.len() {
                warn!("{name} failed on all {count} sources");
            }
        }

        let summary = TaskSummary {
            n_sources: records.len(),
            failures,
        };
        info!(
            "Measured {} sources with {} algorithms, {} failed measurements",
            summary.n_sources,
            self.algorithms.len(),
            summary.total_failures()
        );
        summary
    }
}
