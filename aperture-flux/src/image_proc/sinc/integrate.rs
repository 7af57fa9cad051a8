//! Placing a coefficient image on a source and integrating under it.

use flux_math::ShiftKernel;
use ndarray::{Array2, ArrayView2};

use super::cache::SincCoeffCache;
use super::key::SincKey;
use super::synthesis::SynthesisStrategy;
use crate::error::MeasurementError;
use crate::image_proc::exposure::Exposure;
use crate::image_proc::geometry::{clip, Aperture, PixelBox};

/// Coefficients below this fraction of the peak lie outside the footprint.
const SUPPORT_THRESHOLD: f64 = 1e-12;

/// Raw sums from one sinc aperture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SincSum {
    /// Coefficient-weighted sum of pixel values
    pub flux: f64,
    /// Sum of squared coefficients times variance; None without a variance plane
    pub variance_sum: Option<f64>,
    /// The shifted coefficient footprint extended past the image
    pub coeffs_truncated: bool,
    /// The aperture itself extended past the image
    pub aperture_truncated: bool,
    pub strategy: SynthesisStrategy,
}

impl SincSum {
    /// Square root of the variance sum, NaN when unknown.
    pub fn sigma(&self) -> f64 {
        self.variance_sum.map_or(f64::NAN, f64::sqrt)
    }
}

/// Shift a centred coefficient image by (`dx`, `dy`) pixels.
///
/// Applied separably, first along x and then along y. The result grows by the
/// kernel half-width on every side, so its centre pixel is still the integer
/// pixel the input was centred on.
pub fn shift_coeffs(coeffs: ArrayView2<f64>, dx: f64, dy: f64, kernel: ShiftKernel) -> Array2<f64> {
    let hw = kernel.half_width();
    let (rows, cols) = coeffs.dim();
    let wx = kernel.weights(dx);
    let wy = kernel.weights(dy);

    let mut along_x = Array2::<f64>::zeros((rows, cols + 2 * hw));
    for ((row, col), &value) in coeffs.indexed_iter() {
        if value == 0.0 {
            continue;
        }
        for (k, tap) in wx.iter().enumerate() {
            along_x[[row, col + k]] += tap * value;
        }
    }

    let mut shifted = Array2::<f64>::zeros((rows + 2 * hw, cols + 2 * hw));
    for ((row, col), &value) in along_x.indexed_iter() {
        if value == 0.0 {
            continue;
        }
        for (k, tap) in wy.iter().enumerate() {
            shifted[[row + k, col]] += tap * value;
        }
    }
    shifted
}

/// Box of coefficients above threshold, in the array's own (col, row) indices.
fn support_box(coeffs: &Array2<f64>) -> Option<PixelBox> {
    let peak = coeffs.iter().fold(0.0_f64, |acc, c| acc.max(c.abs()));
    if peak <= 0.0 || !peak.is_finite() {
        return None;
    }
    let threshold = peak * SUPPORT_THRESHOLD;

    let mut support: Option<PixelBox> = None;
    for ((row, col), value) in coeffs.indexed_iter() {
        if value.abs() <= threshold {
            continue;
        }
        let (x, y) = (col as i64, row as i64);
        support = Some(match support {
            None => PixelBox::new(x, y, x, y),
            Some(b) => PixelBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
        });
    }
    support
}

/// Sinc-weighted flux and variance over an aperture.
///
/// Coefficients for the aperture's shape come from `cache`; they are shifted
/// to the sub-pixel centre with `kernel` and dotted with the image (and, squared,
/// with the variance plane) over the part of their footprint inside the image.
/// Mask bits are not consulted.
///
/// # Errors
/// [`MeasurementError::NoPixels`] if the aperture or its coefficients miss
/// the image entirely.
pub fn integrate_sinc(
    exposure: &Exposure,
    aperture: &Aperture,
    cache: &SincCoeffCache,
    kernel: ShiftKernel,
) -> Result<SincSum, MeasurementError> {
    let bounds = exposure.bbox();
    let clipped = clip(aperture, &bounds, 0)?;
    let no_pixels = || MeasurementError::NoPixels {
        x: aperture.center.x,
        y: aperture.center.y,
        radius: aperture.axes.a,
        truncated: clipped.truncated,
    };

    let coeffs = cache.get_or_build(SincKey::from_aperture(aperture));

    let (ix, iy) = (aperture.center.x.round(), aperture.center.y.round());
    let (dx, dy) = (aperture.center.x - ix, aperture.center.y - iy);
    let shifted = shift_coeffs(coeffs.coeffs.view(), dx, dy, kernel);

    // Array index (row, col) sits on image pixel (origin_x + col, origin_y + row).
    let half = (shifted.nrows() / 2) as i64;
    let (origin_x, origin_y) = (ix as i64 - half, iy as i64 - half);

    let local = support_box(&shifted).ok_or_else(no_pixels)?;
    let footprint = PixelBox::new(
        local.min_x + origin_x,
        local.min_y + origin_y,
        local.max_x + origin_x,
        local.max_y + origin_y,
    );
    let region = footprint.intersection(&bounds);
    if region.is_empty() {
        return Err(no_pixels());
    }

    let image = exposure.image();
    let variance = exposure.variance();
    let mut flux = 0.0;
    let mut variance_sum = 0.0;
    for (x, y) in region.pixels() {
        let c = shifted[[(y - origin_y) as usize, (x - origin_x) as usize]];
        let (col, row) = (x as usize, y as usize);
        flux += c * image[[row, col]];
        if let Some(variance) = &variance {
            variance_sum += c * c * variance[[row, col]];
        }
    }

    Ok(SincSum {
        flux,
        variance_sum: variance.map(|_| variance_sum),
        coeffs_truncated: !bounds.contains(&footprint),
        aperture_truncated: clipped.truncated,
        strategy: coeffs.strategy,
    })
}
