//! flux-math - Numeric building blocks for sinc aperture photometry
//!
//! This crate holds the pieces of the photometry engine that know nothing
//! about exposures, records or flags:
//!
//! - **Kernels** - sinc, Lanczos and the shift kernels used to move a
//!   coefficient image to a sub-pixel position
//! - **Ellipse transforms** - closed-form Fourier transform of a uniform ellipse
//! - **FFT** - 2-D inverse transform over an `ndarray` buffer
//! - **Fuzzy** - tolerance comparisons and quantisation of continuous geometry
//!
//! # Example
//!
//! ```
//! use flux_math::{ShiftKernel, uniform_ellipse_ft};
//!
//! let kernel: ShiftKernel = "lanczos3".parse().unwrap();
//! let weights = kernel.weights(0.25);
//! assert_eq!(weights.len(), 7);
//!
//! // At zero frequency the transform is the ellipse area.
//! let area = uniform_ellipse_ft(3.0, 2.0, 0.0, 0.0, 0.0);
//! assert!((area - std::f64::consts::PI * 6.0).abs() < 1e-12);
//! ```

pub mod ellipse_ft;
pub mod fft2;
pub mod fuzzy;
pub mod kernels;

pub use ellipse_ft::uniform_ellipse_ft;
pub use fft2::inverse_fft2;
pub use fuzzy::{dequantize, quantize, FuzzyCompare};
pub use kernels::{lanczos, raised_cosine_taper, sinc, ShiftKernel, UnknownKernelError};
