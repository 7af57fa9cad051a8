//! Naive aperture summation.
//!
//! A pixel contributes its full value when its centre falls inside the
//! aperture and nothing otherwise. There is no sub-pixel weighting, so the
//! result steps as the boundary crosses pixel centres; for small apertures the
//! sinc integrator should be preferred.

use super::exposure::Exposure;
use super::geometry::{clip, Aperture};
use super::mask::MaskPixel;
use crate::error::MeasurementError;

/// Raw sums from one naive aperture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaiveSum {
    /// Sum of pixel values
    pub flux: f64,
    /// Sum of pixel variances; None without a variance plane
    pub variance_sum: Option<f64>,
    /// Number of pixels that contributed
    pub n_pixels: usize,
    /// The aperture extended past the image
    pub truncated: bool,
}

impl NaiveSum {
    /// Square root of the variance sum, NaN when unknown.
    pub fn sigma(&self) -> f64 {
        self.variance_sum.map_or(f64::NAN, f64::sqrt)
    }
}

/// Sum image and variance over pixels whose centres lie inside `aperture`.
///
/// Pixels with any of the `bad_mask` bits set are skipped. Pixels outside the
/// image are dropped and reported through `truncated`.
///
/// # Errors
/// [`MeasurementError::NoPixels`] if the aperture misses the image or no
/// unmasked pixel centre lies inside it.
pub fn integrate_naive(
    exposure: &Exposure,
    aperture: &Aperture,
    bad_mask: MaskPixel,
) -> Result<NaiveSum, MeasurementError> {
    let clipped = clip(aperture, &exposure.bbox(), 0)?;
    let image = exposure.image();
    let variance = exposure.variance();

    let mut flux = 0.0;
    let mut variance_sum = 0.0;
    let mut n_pixels = 0;

    for (x, y) in clipped.region.pixels() {
        if !aperture.contains(x as f64, y as f64) {
            continue;
        }
        let (col, row) = (x as usize, y as usize);
        if exposure.is_masked(col, row, bad_mask) {
            continue;
        }
        flux += image[[row, col]];
        if let Some(variance) = &variance {
            variance_sum += variance[[row, col]];
        }
        n_pixels += 1;
    }

    if n_pixels == 0 {
        return Err(MeasurementError::NoPixels {
            x: aperture.center.x,
            y: aperture.center.y,
            radius: aperture.axes.a,
            truncated: clipped.truncated,
        });
    }

    Ok(NaiveSum {
        flux,
        variance_sum: variance.map(|_| variance_sum),
        n_pixels,
        truncated: clipped.truncated,
    })
}
