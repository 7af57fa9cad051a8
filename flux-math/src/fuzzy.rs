//! Tolerance comparisons and quantisation for floating-point geometry.
//!
//! Aperture shapes arrive with centroid and shape-fit jitter in their last
//! bits. Two tools keep that jitter from leaking into decisions:
//!
//! - [`FuzzyCompare`] answers "are these equal" with a relative and an absolute
//!   tolerance, never with exact `==`.
//! - [`quantize`] maps a continuous value to an integer grid so that it can be
//!   hashed. The grid spacing is part of the caller's contract.

/// Relative-and-absolute tolerance equality test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyCompare {
    /// Allowed difference as a fraction of the larger magnitude
    pub rel_tol: f64,
    /// Allowed difference regardless of magnitude
    pub abs_tol: f64,
}

impl FuzzyCompare {
    pub const fn new(rel_tol: f64, abs_tol: f64) -> Self {
        Self { rel_tol, abs_tol }
    }

    /// True when `a` and `b` differ by no more than either tolerance.
    pub fn is_equal(&self, a: f64, b: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        let diff = (a - b).abs();
        diff <= self.abs_tol || diff <= self.rel_tol * a.abs().max(b.abs())
    }
}

impl Default for FuzzyCompare {
    /// Single-precision scale tolerances.
    fn default() -> Self {
        Self::new(4.0 * f32::EPSILON as f64, 1e-9)
    }
}

/// Index of the grid cell of spacing `quantum` nearest to `value`.
#[inline]
pub fn quantize(value: f64, quantum: f64) -> i64 {
    (value / quantum).round() as i64
}

/// Value at the centre of grid cell `index`.
#[inline]
pub fn dequantize(index: i64, quantum: f64) -> f64 {
    index as f64 * quantum
}
