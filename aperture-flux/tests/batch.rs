//! Batch measurement of many sources with every algorithm registered.

use aperture_flux::algo::flags::{APERTURE_TRUNCATED, FAILURE};
use aperture_flux::algo::gaussian_flux::{NO_CENTROID, NO_SHAPE};
use aperture_flux::algo::{
    ApertureFluxAlgorithm, GaussianFluxAlgorithm, MeasurementTask, NaiveFluxAlgorithm,
    SincFluxAlgorithm, SourceRecord,
};
use aperture_flux::config::{
    AlgorithmConfig, ApertureFluxConfig, GaussianFluxConfig, NaiveFluxConfig, SincFluxConfig,
};
use aperture_flux::image_proc::{plane_bit, Exposure, Point2, Quadrupole};
use approx::assert_relative_eq;
use ndarray::Array2;
use test_helpers::{gaussian_star_image, init_test_logging, output_path, uniform_image};

const STAR_FLUX: f64 = 20_000.0;
const STAR_SIGMA: f64 = 1.8;

fn task() -> MeasurementTask {
    let aperture = ApertureFluxConfig {
        radii: vec![3.0, 6.0, 12.0],
        max_sinc_radius: 6.0,
        ..Default::default()
    };
    MeasurementTask::new()
        .with_algorithm(ApertureFluxAlgorithm::new(aperture).unwrap())
        .with_algorithm(NaiveFluxAlgorithm::new(NaiveFluxConfig::default()).unwrap())
        .with_algorithm(SincFluxAlgorithm::new(SincFluxConfig::default()).unwrap())
        .with_algorithm(GaussianFluxAlgorithm::new(GaussianFluxConfig::default()).unwrap())
}

fn star_field() -> Exposure {
    let mut image = uniform_image(100, 100, 0.0);
    for (x, y) in [(30.2, 30.7), (70.6, 29.4), (50.0, 70.3)] {
        image += &gaussian_star_image(100, 100, x, y, STAR_SIGMA, STAR_FLUX);
    }
    Exposure::new(image)
        .with_variance(uniform_image(100, 100, 1.0))
        .unwrap()
}

fn star_shape() -> Quadrupole {
    Quadrupole::new(STAR_SIGMA * STAR_SIGMA, STAR_SIGMA * STAR_SIGMA, 0.0)
}

#[test]
fn test_batch_measures_and_flags() {
    init_test_logging();
    let task = task();
    let exposure = star_field();

    let mut flagged_centroid = SourceRecord::new(3, Point2::new(50.0, 70.3)).with_shape(star_shape());
    flagged_centroid.centroid_flag = true;
    let mut records = vec![
        SourceRecord::new(0, Point2::new(30.2, 30.7)).with_shape(star_shape()),
        SourceRecord::new(1, Point2::new(70.6, 29.4)),
        SourceRecord::new(2, Point2::new(98.0, 50.0)).with_shape(star_shape()),
        flagged_centroid,
    ];

    let summary = task.run(&mut records, &exposure);
    assert_eq!(summary.n_sources, 4);

    // A clean star: every algorithm succeeds and agrees on the total flux.
    let star = &records[0];
    let apertures = star.apertures(ApertureFluxAlgorithm::DEFAULT_NAME).unwrap();
    assert!(apertures.flags.is_empty());
    assert_relative_eq!(apertures.results[2].flux, STAR_FLUX, max_relative = 0.005);
    assert_relative_eq!(
        star.flux(GaussianFluxAlgorithm::DEFAULT_NAME).unwrap().flux,
        STAR_FLUX,
        max_relative = 0.01
    );
    let sinc = star.flux(SincFluxAlgorithm::DEFAULT_NAME).unwrap();
    let naive = star.flux(NaiveFluxAlgorithm::DEFAULT_NAME).unwrap();
    assert_relative_eq!(sinc.flux, naive.flux, max_relative = 0.01);

    // No shape: only the Gaussian measurement fails.
    let shapeless = &records[1];
    assert!(!shapeless.flux(NaiveFluxAlgorithm::DEFAULT_NAME).unwrap().failed());
    let gaussian = shapeless.flux(GaussianFluxAlgorithm::DEFAULT_NAME).unwrap();
    assert!(gaussian.flags.get(FAILURE));
    assert!(gaussian.flags.get(NO_SHAPE));

    // Near the edge: numbers still come out, flagged as truncated.
    let edge = &records[2];
    let apertures = edge.apertures(ApertureFluxAlgorithm::DEFAULT_NAME).unwrap();
    assert!(apertures.flags.get(APERTURE_TRUNCATED));
    assert!(!apertures.flags.get(FAILURE));
    assert!(apertures.results.iter().all(|r| r.flux.is_finite()));

    // Flagged centroid: every algorithm fails, the batch carries on.
    let failed = &records[3];
    assert!(failed
        .apertures(ApertureFluxAlgorithm::DEFAULT_NAME)
        .unwrap()
        .results
        .iter()
        .all(|r| r.failed() && r.flux.is_nan()));
    assert!(failed.flux(GaussianFluxAlgorithm::DEFAULT_NAME).unwrap().flags.get(NO_CENTROID));

    let failures: usize = summary.failures.iter().map(|(_, n)| n).sum();
    assert_eq!(failures, 1 + 4);
}

#[test]
fn test_masked_pixels_excluded_from_naive() {
    let mut mask = Array2::zeros((21, 21));
    let bad = plane_bit("BAD").unwrap();
    mask[[10, 10]] = bad;
    let exposure = Exposure::new(uniform_image(21, 21, 1.0))
        .with_mask(mask)
        .unwrap();

    let clean = NaiveFluxAlgorithm::new(NaiveFluxConfig {
        radius: 3.0,
        bad_mask_planes: vec![],
    })
    .unwrap()
    .named("clean");
    let masked = NaiveFluxAlgorithm::new(NaiveFluxConfig {
        radius: 3.0,
        ..Default::default()
    })
    .unwrap()
    .named("masked");
    let task = MeasurementTask::new().with_algorithm(clean).with_algorithm(masked);

    let mut records = vec![SourceRecord::new(0, Point2::new(10.0, 10.0))];
    task.run(&mut records, &exposure);
    let clean = records[0].flux("clean").unwrap().flux;
    let masked = records[0].flux("masked").unwrap().flux;
    assert_eq!(clean - masked, 1.0);
}

#[test]
fn test_config_from_file_drives_algorithm() {
    let path = output_path("aperture_flux_batch.json");
    std::fs::write(
        &path,
        r#"{"radii": [5.0], "maxSincRadius": 3.0, "badMaskPlanes": ["BAD"]}"#,
    )
    .unwrap();
    let config = ApertureFluxConfig::from_json_file(&path).unwrap();
    let task = MeasurementTask::new().with_algorithm(ApertureFluxAlgorithm::new(config).unwrap());

    let exposure = Exposure::new(uniform_image(21, 21, 100.0))
        .with_variance(uniform_image(21, 21, 4.0))
        .unwrap();
    let mut records = vec![SourceRecord::new(0, Point2::new(10.0, 10.0))];
    task.run(&mut records, &exposure);

    let result = records[0].apertures(ApertureFluxAlgorithm::DEFAULT_NAME).unwrap().results[0];
    assert_relative_eq!(result.flux, 8100.0);
    assert_relative_eq!(result.flux_sigma, 18.0);
}
