//! Named bit planes of the per-pixel mask.

use crate::error::ConfigError;

/// One mask pixel: a set of plane bits.
pub type MaskPixel = u32;

/// Fixed plane dictionary, name to bit index.
pub const MASK_PLANES: [(&str, u32); 8] = [
    ("BAD", 0),
    ("SAT", 1),
    ("INTRP", 2),
    ("CR", 3),
    ("EDGE", 4),
    ("DETECTED", 5),
    ("SUSPECT", 6),
    ("NO_DATA", 7),
];

/// Bit value of a named plane, if the name is known.
pub fn plane_bit(name: &str) -> Option<MaskPixel> {
    MASK_PLANES
        .iter()
        .find(|(plane, _)| *plane == name)
        .map(|(_, bit)| 1 << bit)
}

/// OR of the bits of every named plane.
///
/// # Errors
/// [`ConfigError::UnknownMaskPlane`] for the first name not in [`MASK_PLANES`].
pub fn plane_bitmask<S: AsRef<str>>(names: &[S]) -> Result<MaskPixel, ConfigError> {
    names.iter().try_fold(0, |mask, name| {
        let name = name.as_ref();
        plane_bit(name)
            .map(|bit| mask | bit)
            .ok_or_else(|| ConfigError::UnknownMaskPlane(name.to_string()))
    })
}
