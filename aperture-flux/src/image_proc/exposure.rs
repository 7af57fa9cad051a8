//! Image, variance and mask planes measured together.

use ndarray::{Array2, ArrayView2};

use super::geometry::PixelBox;
use super::mask::MaskPixel;
use crate::error::MeasurementError;

/// A calibrated image with optional variance and mask planes.
///
/// Planes are indexed `[[row, col]]`, i.e. `[[y, x]]`, with pixel centres at
/// integer coordinates. Without a variance plane every measurement reports a
/// NaN uncertainty; without a mask plane no pixel is excluded.
#[derive(Debug, Clone)]
pub struct Exposure {
    image: Array2<f64>,
    variance: Option<Array2<f64>>,
    mask: Option<Array2<MaskPixel>>,
}

impl Exposure {
    /// Wrap an image plane.
    pub fn new(image: Array2<f64>) -> Self {
        Self {
            image,
            variance: None,
            mask: None,
        }
    }

    /// Attach a variance plane of the same shape as the image.
    pub fn with_variance(mut self, variance: Array2<f64>) -> Result<Self, MeasurementError> {
        self.check_dim("variance", variance.dim())?;
        self.variance = Some(variance);
        Ok(self)
    }

    /// Attach a mask plane of the same shape as the image.
    pub fn with_mask(mut self, mask: Array2<MaskPixel>) -> Result<Self, MeasurementError> {
        self.check_dim("mask", mask.dim())?;
        self.mask = Some(mask);
        Ok(self)
    }

    fn check_dim(&self, plane: &'static str, found: (usize, usize)) -> Result<(), MeasurementError> {
        let expected = self.image.dim();
        if found != expected {
            return Err(MeasurementError::DimensionMismatch {
                plane,
                expected,
                found,
            });
        }
        Ok(())
    }

    pub fn image(&self) -> ArrayView2<'_, f64> {
        self.image.view()
    }

    pub fn variance(&self) -> Option<ArrayView2<'_, f64>> {
        self.variance.as_ref().map(|v| v.view())
    }

    pub fn mask(&self) -> Option<ArrayView2<'_, MaskPixel>> {
        self.mask.as_ref().map(|m| m.view())
    }

    /// Image dimensions as (height, width).
    pub fn dim(&self) -> (usize, usize) {
        self.image.dim()
    }

    /// Pixel bounds of the image.
    pub fn bbox(&self) -> PixelBox {
        let (height, width) = self.image.dim();
        PixelBox::from_shape(width, height)
    }

    /// True when the pixel at (x, y) has any of the `bad` bits set.
    #[inline]
    pub fn is_masked(&self, x: usize, y: usize, bad: MaskPixel) -> bool {
        bad != 0
            && self
                .mask
                .as_ref()
                .is_some_and(|mask| mask[[y, x]] & bad != 0)
    }
}
