//! Synthesis of sinc aperture coefficient images.
//!
//! A coefficient image `c` is the ideal aperture mask (one inside the
//! continuous boundary, zero outside) band-limited and sampled at pixel
//! centres, so that `sum(c * image)` integrates the image over the exact
//! aperture rather than over whole pixels. Two constructions exist:
//!
//! - **Real space**: the mask is supersampled on a fine grid and every
//!   sub-sample is spread onto its neighbouring pixels with a normalised
//!   Lanczos-3 kernel. Cost grows with area times kernel support, so this is
//!   only used for small apertures.
//! - **Frequency space**: the mask's Fourier transform has a closed form
//!   (Bessel J1 for a uniform ellipse). It is evaluated on a grid, rolled off
//!   near Nyquist with a raised-cosine taper and inverse transformed.
//!
//! Both produce an odd-sided image with the aperture centre on the middle
//! pixel, whose coefficients sum to the aperture area.

use flux_math::{inverse_fft2, raised_cosine_taper, uniform_ellipse_ft, ShiftKernel};
use ndarray::Array2;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;

use super::key::SincKey;
use crate::image_proc::geometry::{Aperture, EllipseAxes, Point2};

/// Largest half-width synthesised in real space.
pub const REAL_SPACE_MAX_HALF_WIDTH: usize = 16;

/// Kernel spreading each real-space sub-sample onto pixels.
pub const REAL_SPACE_KERNEL: ShiftKernel = ShiftKernel::Lanczos3;

/// Support of [`REAL_SPACE_KERNEL`] on each side, in pixels.
pub const REAL_SPACE_KERNEL_ORDER: usize = 3;

/// Fewest sub-samples per pixel along each axis in real space.
pub const REAL_SPACE_MIN_SUPERSAMPLE: usize = 16;

/// Most sub-samples per pixel along each axis in real space.
pub const REAL_SPACE_MAX_SUPERSAMPLE: usize = 256;

/// Sub-samples wanted across the semi-minor axis.
pub const REAL_SPACE_SAMPLES_ACROSS: f64 = 64.0;

/// Pixels of ringing kept beyond the aperture edge in frequency space.
pub const FREQUENCY_SPACE_MARGIN: usize = 10;

/// Fraction of Nyquist where the frequency taper starts rolling off.
pub const TAPER_START: f64 = 0.65;

/// How a coefficient image was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthesisStrategy {
    RealSpace,
    FrequencySpace,
}

impl fmt::Display for SynthesisStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisStrategy::RealSpace => f.write_str("real-space"),
            SynthesisStrategy::FrequencySpace => f.write_str("frequency-space"),
        }
    }
}

/// An immutable coefficient image for one canonical aperture shape.
#[derive(Debug, Clone)]
pub struct SincCoeffs {
    pub key: SincKey,
    pub strategy: SynthesisStrategy,
    /// Odd-sided, indexed `[[y, x]]`, aperture centre at `[[h, h]]`
    pub coeffs: Array2<f64>,
}

impl SincCoeffs {
    /// Pixels from the centre to the edge of the image.
    pub fn half_width(&self) -> usize {
        self.coeffs.nrows() / 2
    }

    /// Total of the coefficients, approximately the aperture area.
    pub fn sum(&self) -> f64 {
        self.coeffs.sum()
    }
}

/// Pick the construction for an outer boundary.
pub fn choose_strategy(axes: &EllipseAxes) -> SynthesisStrategy {
    if real_space_half_width(axes) <= REAL_SPACE_MAX_HALF_WIDTH {
        SynthesisStrategy::RealSpace
    } else {
        SynthesisStrategy::FrequencySpace
    }
}

fn max_extent(axes: &EllipseAxes) -> usize {
    let (ex, ey) = axes.half_extents();
    ex.max(ey).ceil() as usize
}

fn real_space_half_width(axes: &EllipseAxes) -> usize {
    max_extent(axes) + REAL_SPACE_KERNEL_ORDER + 1
}

/// Sub-samples per pixel for an aperture of semi-minor axis `b`.
///
/// Small apertures are sampled more finely so that their boundary still
/// spans [`REAL_SPACE_SAMPLES_ACROSS`] sub-samples.
pub fn real_space_supersample(b: f64) -> usize {
    if b.is_nan() || b <= 0.0 {
        return REAL_SPACE_MAX_SUPERSAMPLE;
    }
    let wanted = (REAL_SPACE_SAMPLES_ACROSS / b).ceil();
    if wanted >= REAL_SPACE_MAX_SUPERSAMPLE as f64 {
        REAL_SPACE_MAX_SUPERSAMPLE
    } else {
        (wanted as usize).max(REAL_SPACE_MIN_SUPERSAMPLE)
    }
}

/// Build the coefficient image for `key` with the strategy its size calls for.
pub fn synthesize(key: SincKey) -> SincCoeffs {
    let axes = key.axes();
    let strategy = choose_strategy(&axes);
    let coeffs = match strategy {
        SynthesisStrategy::RealSpace => synthesize_real_space(&axes, key.inner_ratio()),
        SynthesisStrategy::FrequencySpace => {
            synthesize_frequency_space(&axes, key.inner_ratio())
        }
    };
    SincCoeffs {
        key,
        strategy,
        coeffs,
    }
}

/// Supersample the mask and spread each sub-sample with a Lanczos-3 kernel.
///
/// The sub-sample grid is [`real_space_supersample`] of the semi-minor axis.
pub fn synthesize_real_space(axes: &EllipseAxes, inner_ratio: f64) -> Array2<f64> {
    let half = real_space_half_width(axes);
    let size = 2 * half + 1;
    let mut coeffs = Array2::<f64>::zeros((size, size));

    let aperture = Aperture::annulus(Point2::new(0.0, 0.0), *axes, inner_ratio);
    let kernel = REAL_SPACE_KERNEL;
    let order = REAL_SPACE_KERNEL_ORDER as i64;

    // Sub-sample offsets are the same inside every pixel, and so are their taps.
    let s = real_space_supersample(axes.b);
    let offsets: Vec<f64> = (0..s).map(|j| (j as f64 + 0.5) / s as f64 - 0.5).collect();
    let taps: Vec<Vec<f64>> = offsets.iter().map(|&frac| kernel.weights(frac)).collect();
    let sample_weight = 1.0 / (s * s) as f64;

    let reach = max_extent(axes) as i64;
    let h = half as i64;
    for py in -reach..=reach {
        for px in -reach..=reach {
            for (jy, &oy) in offsets.iter().enumerate() {
                for (jx, &ox) in offsets.iter().enumerate() {
                    if !aperture.contains(px as f64 + ox, py as f64 + oy) {
                        continue;
                    }
                    let (wx, wy) = (&taps[jx], &taps[jy]);
                    for (ky, ty) in wy.iter().enumerate() {
                        let row = (h + py + ky as i64 - order) as usize;
                        let scale = ty * sample_weight;
                        for (kx, tx) in wx.iter().enumerate() {
                            let col = (h + px + kx as i64 - order) as usize;
                            coeffs[[row, col]] += scale * tx;
                        }
                    }
                }
            }
        }
    }

    coeffs
}

/// Evaluate the analytic mask transform, taper it and invert.
pub fn synthesize_frequency_space(axes: &EllipseAxes, inner_ratio: f64) -> Array2<f64> {
    let half = max_extent(axes) + FREQUENCY_SPACE_MARGIN;
    let size = 2 * half + 1;
    let n = (2 * size).next_power_of_two();

    let inner = axes.scaled(inner_ratio);
    let freqs: Vec<f64> = (0..n)
        .map(|i| {
            let signed = if i < n / 2 { i as f64 } else { i as f64 - n as f64 };
            2.0 * PI * signed / n as f64
        })
        .collect();
    let tapers: Vec<f64> = freqs
        .iter()
        .map(|&k| raised_cosine_taper(k, TAPER_START))
        .collect();

    let mut spectrum = Array2::<Complex64>::zeros((n, n));
    for ((iy, ix), value) in spectrum.indexed_iter_mut() {
        let taper = tapers[iy] * tapers[ix];
        if taper == 0.0 {
            continue;
        }
        let (kx, ky) = (freqs[ix], freqs[iy]);
        let mut ft = uniform_ellipse_ft(axes.a, axes.b, axes.theta, kx, ky);
        if inner_ratio > 0.0 {
            ft -= uniform_ellipse_ft(inner.a, inner.b, inner.theta, kx, ky);
        }
        *value = Complex64::new(ft * taper, 0.0);
    }

    inverse_fft2(&mut spectrum);

    // Pixel offset d lives at index d mod n.
    let h = half as i64;
    let n = n as i64;
    Array2::from_shape_fn((size, size), |(row, col)| {
        let dy = (row as i64 - h).rem_euclid(n) as usize;
        let dx = (col as i64 - h).rem_euclid(n) as usize;
        spectrum[[dy, dx]].re
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_symmetric(coeffs: &Array2<f64>) {
        let size = coeffs.nrows();
        for ((row, col), value) in coeffs.indexed_iter() {
            let mirrored = coeffs[[size - 1 - row, size - 1 - col]];
            assert!((value - mirrored).abs() < 1e-9, "asymmetric at ({row}, {col})");
        }
    }

    #[test]
    fn test_strategy_crossover() {
        assert_eq!(
            choose_strategy(&EllipseAxes::circle(5.0)),
            SynthesisStrategy::RealSpace
        );
        assert_eq!(
            choose_strategy(&EllipseAxes::circle(12.0)),
            SynthesisStrategy::RealSpace
        );
        assert_eq!(
            choose_strategy(&EllipseAxes::circle(12.5)),
            SynthesisStrategy::FrequencySpace
        );
    }

    #[test]
    fn test_supersample_grows_for_small_apertures() {
        assert_eq!(real_space_supersample(5.0), REAL_SPACE_MIN_SUPERSAMPLE);
        assert_eq!(real_space_supersample(0.5), 128);
        assert_eq!(real_space_supersample(0.01), REAL_SPACE_MAX_SUPERSAMPLE);
        assert_eq!(real_space_supersample(0.0), REAL_SPACE_MAX_SUPERSAMPLE);
    }

    #[test]
    fn test_small_real_space_sums_to_area() {
        for radius in [0.25, 0.5, 1.0] {
            let axes = EllipseAxes::circle(radius);
            let coeffs = synthesize_real_space(&axes, 0.0);
            assert_relative_eq!(coeffs.sum(), axes.area(), max_relative = 0.01);
            assert_symmetric(&coeffs);
        }
        let thin = EllipseAxes::new(2.0, 0.3, 0.4);
        assert_relative_eq!(synthesize_real_space(&thin, 0.0).sum(), thin.area(), max_relative = 0.01);
    }

    #[test]
    fn test_real_space_sums_to_area() {
        let axes = EllipseAxes::circle(5.0);
        let coeffs = synthesize_real_space(&axes, 0.0);
        assert_eq!(coeffs.dim(), (2 * 9 + 1, 2 * 9 + 1));
        assert_relative_eq!(coeffs.sum(), axes.area(), max_relative = 5e-3);
        assert_symmetric(&coeffs);
    }

    #[test]
    fn test_real_space_interior_is_unity() {
        let coeffs = synthesize_real_space(&EllipseAxes::circle(6.0), 0.0);
        let h = coeffs.nrows() / 2;
        assert_relative_eq!(coeffs[[h, h]], 1.0, epsilon = 1e-9);
        assert_relative_eq!(coeffs[[h + 1, h]], 1.0, epsilon = 1e-9);
        // Beyond the kernel reach of the edge everything is exactly zero.
        assert_eq!(coeffs[[h, 0]], 0.0);
    }

    #[test]
    fn test_real_space_annulus_area() {
        let axes = EllipseAxes::circle(8.0);
        let coeffs = synthesize_real_space(&axes, 0.5);
        assert_relative_eq!(coeffs.sum(), axes.area() * 0.75, max_relative = 5e-3);
        let h = coeffs.nrows() / 2;
        assert!(coeffs[[h, h]].abs() < 1e-9);
    }

    #[test]
    fn test_real_space_ellipse_area() {
        let axes = EllipseAxes::new(7.0, 3.0, 0.7);
        let coeffs = synthesize_real_space(&axes, 0.0);
        assert_relative_eq!(coeffs.sum(), axes.area(), max_relative = 5e-3);
        assert_symmetric(&coeffs);
    }

    #[test]
    fn test_frequency_space_matches_area() {
        let axes = EllipseAxes::circle(20.0);
        let coeffs = synthesize_frequency_space(&axes, 0.0);
        assert_eq!(coeffs.nrows(), 2 * 30 + 1);
        assert_relative_eq!(coeffs.sum(), axes.area(), max_relative = 5e-3);
        let h = coeffs.nrows() / 2;
        assert_relative_eq!(coeffs[[h, h]], 1.0, epsilon = 0.02);
        assert!(coeffs[[h, 2]].abs() < 0.02);
        assert_symmetric(&coeffs);
    }

    #[test]
    fn test_frequency_space_annulus() {
        let axes = EllipseAxes::circle(20.0);
        let coeffs = synthesize_frequency_space(&axes, 0.5);
        assert_relative_eq!(coeffs.sum(), axes.area() * 0.75, max_relative = 5e-3);
    }

    #[test]
    fn test_strategies_agree() {
        let axes = EllipseAxes::new(6.0, 4.0, 0.3);
        let real = synthesize_real_space(&axes, 0.0);
        let freq = synthesize_frequency_space(&axes, 0.0);

        // Compare on the common centred window.
        let (hr, hf) = ((real.nrows() / 2) as i64, (freq.nrows() / 2) as i64);
        for dy in -hr..=hr {
            for dx in -hr..=hr {
                let a = real[[(hr + dy) as usize, (hr + dx) as usize]];
                let b = freq[[(hf + dy) as usize, (hf + dx) as usize]];
                assert!((a - b).abs() < 0.2, "({dx}, {dy}): {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_synthesize_tags_result() {
        let key = SincKey::new(4.0, 0.0, 0.0, 0.0);
        let coeffs = synthesize(key);
        assert_eq!(coeffs.key, key);
        assert_eq!(coeffs.strategy, SynthesisStrategy::RealSpace);
        assert_eq!(coeffs.half_width(), 8);
        assert_relative_eq!(coeffs.sum(), PI * 16.0, max_relative = 5e-3);
    }
}
