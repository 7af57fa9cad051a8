//! Test helpers for the photometry workspace
//!
//! Synthetic images with known fluxes, deterministic noise, logging setup and
//! a scratch directory for files written by tests.

use ndarray::Array2;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::env;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no workspace Cargo.toml above {0}")]
    NoWorkspace(PathBuf),
}

/// Route `log` output through the test harness. Safe to call from every test.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Constant plane of `height` rows and `width` columns.
pub fn uniform_image(width: usize, height: usize, value: f64) -> Array2<f64> {
    Array2::from_elem((height, width), value)
}

/// Plane whose value is `offset + slope * x`.
pub fn horizontal_gradient(width: usize, height: usize, offset: f64, slope: f64) -> Array2<f64> {
    Array2::from_shape_fn((height, width), |(_, col)| offset + slope * col as f64)
}

/// Circular Gaussian star of total `flux` sampled at pixel centres.
pub fn gaussian_star_image(
    width: usize,
    height: usize,
    x0: f64,
    y0: f64,
    sigma: f64,
    flux: f64,
) -> Array2<f64> {
    let norm = flux / (2.0 * PI * sigma * sigma);
    Array2::from_shape_fn((height, width), |(row, col)| {
        let dx = col as f64 - x0;
        let dy = row as f64 - y0;
        norm * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp()
    })
}

/// Add zero-mean Gaussian noise with per-pixel standard deviation
/// `sqrt(variance)`, reproducibly from `seed`.
pub fn add_gaussian_noise(image: &mut Array2<f64>, variance: &Array2<f64>, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for (pixel, &var) in image.iter_mut().zip(variance.iter()) {
        if var > 0.0 {
            if let Ok(normal) = Normal::new(0.0, var.sqrt()) {
                *pixel += normal.sample(&mut rng);
            }
        }
    }
}

fn is_workspace_manifest(dir: &Path) -> Result<bool, TestHelperError> {
    let manifest = dir.join("Cargo.toml");
    if !manifest.is_file() {
        return Ok(false);
    }
    let content = std::fs::read_to_string(&manifest).map_err(|source| TestHelperError::Io {
        path: manifest.clone(),
        source,
    })?;
    Ok(content.lines().any(|line| line.trim() == "[workspace]"))
}

/// Root of the aperture photometry workspace, searched for upwards from
/// `start`.
pub fn workspace_root_from(start: &Path) -> Result<PathBuf, TestHelperError> {
    for dir in start.ancestors() {
        if is_workspace_manifest(dir)? {
            return Ok(dir.to_path_buf());
        }
    }
    Err(TestHelperError::NoWorkspace(start.to_path_buf()))
}

/// Root of the workspace the tests are running in.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let cwd = env::current_dir().map_err(|source| TestHelperError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    workspace_root_from(&cwd)
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("test run outside the workspace"));

/// `test_output/` under the workspace root, where tests write config files
/// and other artefacts.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");
    std::fs::create_dir_all(&output_dir).expect("cannot create test_output");
    output_dir
}

pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_flux_sums() {
        let star = gaussian_star_image(40, 40, 20.3, 19.7, 2.0, 1000.0);
        assert!((star.sum() - 1000.0).abs() < 1e-6);
        let peak = star.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(peak, star[[20, 20]]);
    }

    #[test]
    fn test_noise_is_reproducible() {
        let variance = uniform_image(32, 32, 9.0);
        let mut a = uniform_image(32, 32, 0.0);
        let mut b = uniform_image(32, 32, 0.0);
        add_gaussian_noise(&mut a, &variance, 42);
        add_gaussian_noise(&mut b, &variance, 42);
        assert_eq!(a, b);

        let mean = a.mean().unwrap();
        let var = a.mapv(|v| (v - mean) * (v - mean)).mean().unwrap();
        assert!(mean.abs() < 0.6);
        assert!((var - 9.0).abs() < 2.0);
    }

    #[test]
    fn test_gradient() {
        let ramp = horizontal_gradient(5, 3, 1.0, 2.0);
        assert_eq!(ramp.dim(), (3, 5));
        assert_eq!(ramp[[2, 4]], 9.0);
    }

    #[test]
    fn test_output_path() {
        let path = output_path("config.json");
        assert_eq!(path, get_output_dir().join("config.json"));
        assert!(find_project_root().unwrap().join("Cargo.toml").exists());
    }

    #[test]
    fn test_workspace_root_from_member() {
        let root = find_project_root().unwrap();
        let member = root.join("aperture-flux").join("src");
        assert_eq!(workspace_root_from(&member).unwrap(), root);
        assert!(matches!(
            workspace_root_from(Path::new("/")),
            Err(TestHelperError::NoWorkspace(_))
        ));
    }
}
