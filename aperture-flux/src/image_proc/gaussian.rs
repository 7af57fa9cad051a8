//! Flux under a fixed elliptical Gaussian weight.
//!
//! For a source whose light profile is itself an elliptical Gaussian with
//! second moments `Q`, weighting the image by `w(d) = exp(-d' Q^-1 d / 2)`
//! captures exactly half of the flux, so the weighted sum is doubled. The
//! weight is the same linear combination for the variance plane, giving
//! `sigma = 2 sqrt(sum(w^2 V))`.

use super::exposure::Exposure;
use super::geometry::{clip, Aperture, Point2, Quadrupole};
use super::mask::MaskPixel;
use crate::error::MeasurementError;

/// Raw sums from one Gaussian-weighted measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSum {
    /// Doubled weighted sum, the total flux of a matching Gaussian source
    pub flux: f64,
    /// Variance of `flux`; None without a variance plane
    pub variance_sum: Option<f64>,
    /// Pixels that carried weight
    pub n_pixels: usize,
    /// The truncated weight region extended past the image
    pub edge: bool,
}

impl GaussianSum {
    pub fn sigma(&self) -> f64 {
        self.variance_sum.map_or(f64::NAN, f64::sqrt)
    }
}

/// Dot product of the image with a Gaussian weight of moments `shape`.
///
/// The weight is cut off where the Mahalanobis distance from `center`
/// exceeds `truncation_sigma`. Masked pixels (any `bad_mask` bit) and pixels
/// outside the image carry no weight.
///
/// # Errors
/// - [`MeasurementError::NoShape`] if `shape` is not positive-definite
/// - [`MeasurementError::NoGoodPixels`] if no weighted pixel survives
pub fn compute_fixed_moments_flux(
    exposure: &Exposure,
    center: Point2,
    shape: &Quadrupole,
    bad_mask: MaskPixel,
    truncation_sigma: f64,
) -> Result<GaussianSum, MeasurementError> {
    let (inv_xx, inv_yy, inv_xy) = shape
        .inverse()
        .ok_or_else(|| MeasurementError::NoShape(format!("moments {shape:?} are not positive-definite")))?;

    let region = Aperture::new(center, shape.to_axes().scaled(truncation_sigma));
    let clipped = clip(&region, &exposure.bbox(), 0).map_err(|_| MeasurementError::NoGoodPixels)?;

    let image = exposure.image();
    let variance = exposure.variance();
    let cutoff = truncation_sigma * truncation_sigma;

    let mut weighted = 0.0;
    let mut weighted_variance = 0.0;
    let mut n_pixels = 0;

    for (x, y) in clipped.region.pixels() {
        let dx = x as f64 - center.x;
        let dy = y as f64 - center.y;
        let r2 = inv_xx * dx * dx + 2.0 * inv_xy * dx * dy + inv_yy * dy * dy;
        if r2 > cutoff {
            continue;
        }
        let (col, row) = (x as usize, y as usize);
        if exposure.is_masked(col, row, bad_mask) {
            continue;
        }
        let w = (-0.5 * r2).exp();
        weighted += w * image[[row, col]];
        if let Some(variance) = &variance {
            weighted_variance += w * w * variance[[row, col]];
        }
        n_pixels += 1;
    }

    if n_pixels == 0 {
        return Err(MeasurementError::NoGoodPixels);
    }

    Ok(GaussianSum {
        flux: 2.0 * weighted,
        variance_sum: variance.map(|_| 4.0 * weighted_variance),
        n_pixels,
        edge: clipped.truncated,
    })
}
