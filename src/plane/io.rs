//! Preview export via the `image` crate.
//!
//! Available when the `image-io` feature is enabled. The raw container is the
//! real output; this writes a 16-bit grayscale PNG for quick inspection.

use std::path::Path;

use image::{ImageBuffer, Luma};

use crate::plane::OutputPlane;
use crate::util::{RawStackError, Result};

/// Maps `[min, max]` of the plane linearly onto `[0, 65535]`.
///
/// Variance and standard deviation planes are far darker than raw data; this
/// makes them visible. Constant planes map to zero.
pub fn stretch_to_full_range(plane: &OutputPlane) -> Vec<u16> {
    let stats = plane.stats();
    let span = u32::from(stats.max - stats.min);
    if span == 0 {
        return vec![0; plane.len()];
    }
    plane
        .as_slice()
        .iter()
        .map(|&v| (u32::from(v - stats.min) * u32::from(u16::MAX) / span) as u16)
        .collect()
}

/// Writes `plane` as a 16-bit grayscale PNG, optionally stretched.
pub fn save_preview_png<P: AsRef<Path>>(plane: &OutputPlane, path: P, stretch: bool) -> Result<()> {
    let samples = if stretch {
        stretch_to_full_range(plane)
    } else {
        plane.as_slice().to_vec()
    };
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(plane.width() as u32, plane.height() as u32, samples).ok_or(
            RawStackError::ImageIo {
                reason: "plane does not fit image buffer".to_string(),
            },
        )?;
    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| RawStackError::ImageIo {
            reason: err.to_string(),
        })
}
