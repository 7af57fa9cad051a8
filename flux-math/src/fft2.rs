//! Two-dimensional inverse FFT over `ndarray` buffers.

use ndarray::Array2;
use rustfft::{num_complex::Complex64, FftPlanner};

/// Normalised inverse 2-D FFT, in place.
///
/// Transforms every row and then every column with rustfft's inverse plan
/// (positive exponent) and divides by the number of samples, so that
/// `inverse_fft2(fft2(x)) == x`. Any shape is accepted; power-of-two sides
/// are fastest.
pub fn inverse_fft2(data: &mut Array2<Complex64>) {
    let (rows, cols) = data.dim();
    if rows == 0 || cols == 0 {
        return;
    }

    let mut planner = FftPlanner::new();
    let row_fft = planner.plan_fft_inverse(cols);
    let col_fft = planner.plan_fft_inverse(rows);

    let mut scratch: Vec<Complex64> = Vec::with_capacity(rows.max(cols));

    for mut row in data.rows_mut() {
        scratch.clear();
        scratch.extend(row.iter().copied());
        row_fft.process(&mut scratch);
        for (dst, src) in row.iter_mut().zip(&scratch) {
            *dst = *src;
        }
    }

    for mut col in data.columns_mut() {
        scratch.clear();
        scratch.extend(col.iter().copied());
        col_fft.process(&mut scratch);
        for (dst, src) in col.iter_mut().zip(&scratch) {
            *dst = *src;
        }
    }

    let norm = 1.0 / (rows * cols) as f64;
    data.mapv_inplace(|c| c * norm);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_spectrum_gives_delta() {
        let n = 8;
        let mut data = Array2::from_elem((n, n), Complex64::new(1.0, 0.0));
        inverse_fft2(&mut data);

        assert_relative_eq!(data[[0, 0]].re, 1.0, epsilon = 1e-12);
        for ((r, c), value) in data.indexed_iter() {
            if (r, c) != (0, 0) {
                assert!(value.norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_single_mode_gives_plane_wave() {
        let n = 16;
        let mut data = Array2::from_elem((n, n), Complex64::new(0.0, 0.0));
        data[[0, 1]] = Complex64::new(n as f64 * n as f64, 0.0);
        inverse_fft2(&mut data);

        // One cycle across the columns, constant down the rows.
        for ((_, c), value) in data.indexed_iter() {
            let phase = 2.0 * std::f64::consts::PI * c as f64 / n as f64;
            assert_relative_eq!(value.re, phase.cos(), epsilon = 1e-10);
            assert_relative_eq!(value.im, phase.sin(), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_empty_is_noop() {
        let mut data = Array2::<Complex64>::zeros((0, 4));
        inverse_fft2(&mut data);
        assert_eq!(data.dim(), (0, 4));
    }
}
