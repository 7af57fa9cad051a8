use flux_math::UnknownKernelError;
use thiserror::Error;

/// Errors that end a single measurement.
///
/// These never escape the batch driver: each algorithm's `fail` turns them
/// into flags on the source record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    /// The aperture, once clipped to the image, covers no usable pixels.
    #[error("aperture at ({x:.2}, {y:.2}) with radius {radius:.2} has no pixels inside the image")]
    NoPixels {
        /// Aperture centre x.
        x: f64,
        /// Aperture centre y.
        y: f64,
        /// Semi-major radius of the aperture.
        radius: f64,
        /// The aperture's pixel box extended past the image.
        truncated: bool,
    },

    /// The record carries no centroid, or its centroid is flagged.
    #[error("no usable centroid")]
    NoCentroid,

    /// The record carries no shape, its shape is flagged, or it is degenerate.
    #[error("no usable shape: {0}")]
    NoShape(String),

    /// Every pixel in the weight region is masked or outside the image.
    #[error("no unmasked pixels in the weight region")]
    NoGoodPixels,

    /// An exposure plane does not match the image dimensions.
    #[error("{plane} plane has shape {found:?}, expected {expected:?}")]
    DimensionMismatch {
        /// Name of the offending plane.
        plane: &'static str,
        /// Image dimensions (rows, cols).
        expected: (usize, usize),
        /// Plane dimensions (rows, cols).
        found: (usize, usize),
    },
}

/// Errors rejected when an algorithm is configured, before any measurement.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} out of range: {value}")]
    InvalidRadius { field: &'static str, value: f64 },

    #[error("inner radius {inner} must be smaller than outer radius {outer}")]
    InvertedRadii { inner: f64, outer: f64 },

    #[error("maxSincRadius must be finite and non-negative, got {0}")]
    InvalidMaxSincRadius(f64),

    #[error("ellipticity must lie in [0, 1), got {0}")]
    InvalidEllipticity(f64),

    #[error("angle must be finite, got {0}")]
    InvalidAngle(f64),

    #[error("truncationSigma must be finite and positive, got {0}")]
    InvalidTruncation(f64),

    #[error("unknown mask plane '{0}'")]
    UnknownMaskPlane(String),

    #[error(transparent)]
    UnknownShiftKernel(#[from] UnknownKernelError),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
