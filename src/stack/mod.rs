//! The stacked sample buffer.
//!
//! A [`SampleBuffer`] holds `n_images` planes of `width * height` samples in
//! one contiguous allocation, image-major: pixel `i` of image `j` lives at
//! `j * plane_size + i`. Reduction kernels walk a fixed pixel down the image
//! axis, so a [`Column`] is a view strided by `plane_size`.

use crate::util::{RawStackError, Result};

mod ingest;

pub use ingest::{expand_inputs, list_directory};

/// Owned stack of equally sized raw sample planes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleBuffer {
    data: Vec<u16>,
    width: usize,
    height: usize,
    n_images: usize,
    max_value: u16,
}

impl SampleBuffer {
    /// Wraps a flat image-major buffer of `n_images` planes.
    pub fn from_vec(
        data: Vec<u16>,
        width: usize,
        height: usize,
        n_images: usize,
        max_value: u16,
    ) -> Result<Self> {
        let total = total_size(width, height, n_images)?;
        if data.len() != total {
            return Err(RawStackError::PlaneLength {
                expected: total,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            n_images,
            max_value,
        })
    }

    /// Concatenates planes in order; every plane must hold `width * height` samples.
    pub fn from_planes<P: AsRef<[u16]>>(
        planes: &[P],
        width: usize,
        height: usize,
        max_value: u16,
    ) -> Result<Self> {
        let total = total_size(width, height, planes.len())?;
        let plane_size = width * height;
        let mut data = Vec::with_capacity(total);
        for plane in planes {
            let plane = plane.as_ref();
            if plane.len() != plane_size {
                return Err(RawStackError::PlaneLength {
                    expected: plane_size,
                    got: plane.len(),
                });
            }
            data.extend_from_slice(plane);
        }
        Self::from_vec(data, width, height, planes.len(), max_value)
    }

    /// Plane width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of stacked images.
    pub fn n_images(&self) -> usize {
        self.n_images
    }

    /// Samples per plane (`width * height`).
    pub fn plane_size(&self) -> usize {
        self.width * self.height
    }

    /// Samples in the whole stack.
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    /// Largest sample value the source bit depth can represent.
    pub fn max_value(&self) -> u16 {
        self.max_value
    }

    /// Backing image-major slice.
    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    /// Returns plane `index` as decoded.
    pub fn plane(&self, index: usize) -> Option<&[u16]> {
        if index >= self.n_images {
            return None;
        }
        let start = index * self.plane_size();
        self.data.get(start..start + self.plane_size())
    }

    /// The first decoded plane; always present.
    pub fn first_plane(&self) -> &[u16] {
        &self.data[..self.plane_size()]
    }

    /// Sample `pixel` of image `image`.
    pub fn sample(&self, image: usize, pixel: usize) -> Option<u16> {
        if image >= self.n_images || pixel >= self.plane_size() {
            return None;
        }
        Some(self.data[image * self.plane_size() + pixel])
    }

    /// All samples at `pixel`, one per image in stack order.
    ///
    /// # Panics
    /// Panics if `pixel >= plane_size()`.
    pub fn column(&self, pixel: usize) -> Column<'_> {
        assert!(pixel < self.plane_size(), "pixel index out of bounds");
        Column {
            data: &self.data[pixel..],
            stride: self.plane_size(),
            len: self.n_images,
        }
    }

    /// Releases the backing buffer.
    pub fn into_vec(self) -> Vec<u16> {
        self.data
    }
}

/// Samples of one pixel across the stack, strided by `plane_size`.
#[derive(Clone, Copy, Debug)]
pub struct Column<'a> {
    data: &'a [u16],
    stride: usize,
    len: usize,
}

impl<'a> Column<'a> {
    /// Number of samples (the stack's image count).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false for columns of a valid stack.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sample from image `image`.
    pub fn get(&self, image: usize) -> Option<u16> {
        if image >= self.len {
            return None;
        }
        self.data.get(image * self.stride).copied()
    }

    /// Iterates samples in stack order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + 'a {
        self.data.iter().step_by(self.stride).take(self.len).copied()
    }
}

fn total_size(width: usize, height: usize, n_images: usize) -> Result<usize> {
    if width == 0 || height == 0 || n_images == 0 {
        return Err(RawStackError::InvalidDimensions {
            width,
            height,
            n_images,
        });
    }
    width
        .checked_mul(height)
        .and_then(|plane| plane.checked_mul(n_images))
        .ok_or(RawStackError::InvalidDimensions {
            width,
            height,
            n_images,
        })
}
