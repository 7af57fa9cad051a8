//! Sub-pixel aperture photometry with band-limited coefficient images.
//!
//! The pieces run in order: [`key`] reduces an aperture's shape to a hashable
//! grid cell, [`synthesis`] builds that cell's coefficient image, [`cache`]
//! keeps each image for the rest of the run and [`integrate`] places it on a
//! source and sums the weighted pixels.

pub mod cache;
pub mod integrate;
pub mod key;
pub mod synthesis;

pub use cache::SincCoeffCache;
pub use integrate::{integrate_sinc, shift_coeffs, SincSum};
pub use key::SincKey;
pub use synthesis::{choose_strategy, synthesize, SincCoeffs, SynthesisStrategy};
