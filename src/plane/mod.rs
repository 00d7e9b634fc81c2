//! Owned output planes.
//!
//! An [`OutputPlane`] is what every reduction returns: one sample per pixel,
//! row-major, with the dimensions of the stack it came from. It owns its
//! buffer outright and lives independently of the stack.

use crate::util::{RawStackError, Result};

#[cfg(feature = "image-io")]
pub mod io;

/// Result plane of a reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPlane {
    data: Vec<u16>,
    width: usize,
    height: usize,
}

/// Summary of an output plane's values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneStats {
    pub min: u16,
    pub max: u16,
    pub mean: f64,
}

impl OutputPlane {
    /// Wraps `data`, which must hold exactly `width * height` samples.
    pub fn new(data: Vec<u16>, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RawStackError::InvalidDimensions {
                width,
                height,
                n_images: 1,
            });
        }
        let expected = width
            .checked_mul(height)
            .ok_or(RawStackError::InvalidDimensions {
                width,
                height,
                n_images: 1,
            })?;
        if data.len() != expected {
            return Err(RawStackError::PlaneLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of samples (`width * height`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Never true for a constructed plane.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u16> {
        self.data
    }

    /// Returns the sample at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns row `y`.
    pub fn row(&self, y: usize) -> Option<&[u16]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }

    /// Top-left `rows x cols` corner, clipped to the plane.
    pub fn preview(&self, rows: usize, cols: usize) -> Vec<Vec<u16>> {
        let cols = cols.min(self.width);
        (0..rows.min(self.height))
            .filter_map(|y| self.row(y))
            .map(|row| row[..cols].to_vec())
            .collect()
    }

    /// Min, max and mean of all samples.
    pub fn stats(&self) -> PlaneStats {
        let (min, max, sum) = self
            .data
            .iter()
            .fold((u16::MAX, 0u16, 0u64), |(lo, hi, sum), &v| {
                (lo.min(v), hi.max(v), sum + u64::from(v))
            });
        PlaneStats {
            min,
            max,
            mean: sum as f64 / self.data.len() as f64,
        }
    }
}
