pub mod exposure;
pub mod gaussian;
pub mod geometry;
pub mod mask;
pub mod naive;
pub mod sinc;

pub use exposure::Exposure;
pub use gaussian::{compute_fixed_moments_flux, GaussianSum};
pub use geometry::{clip, Aperture, ClippedAperture, EllipseAxes, PixelBox, Point2, Quadrupole};
pub use mask::{plane_bit, plane_bitmask, MaskPixel, MASK_PLANES};
pub use naive::{integrate_naive, NaiveSum};
pub use sinc::{integrate_sinc, SincCoeffCache, SincCoeffs, SincKey, SincSum, SynthesisStrategy};
