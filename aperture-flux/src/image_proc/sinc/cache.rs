//! Shared store of synthesised coefficient images.

use log::debug;
use once_cell::sync::{Lazy, OnceCell};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::key::SincKey;
use super::synthesis::{synthesize, SincCoeffs};

type Slot = Arc<OnceCell<Arc<SincCoeffs>>>;

static GLOBAL_CACHE: Lazy<Arc<SincCoeffCache>> = Lazy::new(|| Arc::new(SincCoeffCache::new()));

/// Insert-once map from canonical key to coefficient image.
///
/// The map lock is held only long enough to find or create a key's slot.
/// Synthesis then runs inside that slot's `OnceCell`, so one worker builds a
/// given key while others asking for it wait, and different keys build in
/// parallel. Entries are never evicted.
#[derive(Debug, Default)]
pub struct SincCoeffCache {
    slots: Mutex<HashMap<SincKey, Slot>>,
    synthesized: AtomicUsize,
}

impl SincCoeffCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache shared by algorithms that are not given their own.
    pub fn global() -> Arc<SincCoeffCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Coefficients for `key`, synthesising them on first request.
    pub fn get_or_build(&self, key: SincKey) -> Arc<SincCoeffs> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };

        let coeffs = slot.get_or_init(|| {
            self.synthesized.fetch_add(1, Ordering::Relaxed);
            let coeffs = synthesize(key);
            debug!(
                "Synthesised sinc coefficients for {} ({}, {}x{})",
                key,
                coeffs.strategy,
                coeffs.coeffs.nrows(),
                coeffs.coeffs.ncols()
            );
            Arc::new(coeffs)
        });
        Arc::clone(coeffs)
    }

    /// Build `key` ahead of the first measurement that needs it.
    pub fn prewarm(&self, key: SincKey) {
        self.get_or_build(key);
    }

    /// Number of synthesis runs so far.
    pub fn synthesis_count(&self) -> usize {
        self.synthesized.load(Ordering::Relaxed)
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
