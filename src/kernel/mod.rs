//! Pixel-wise reduction kernels.
//!
//! A kernel turns one [`Column`] (every image's sample at one pixel) into one
//! output sample. [`run`] drives a kernel over the whole plane: the pixel
//! range is split into one static chunk per worker, each worker owns its
//! output slice and a private scratch buffer, and the inner loop walks the
//! image axis sequentially.

use crate::pool::WorkerPool;
use crate::stack::{Column, SampleBuffer};
use crate::util::Result;

pub mod scalar;

#[cfg(feature = "rayon")]
pub(crate) mod rayon;

/// Reduces the samples of one pixel to a single output sample.
pub trait PixelKernel: Sync {
    /// Computes the output for `pixel` from its `column`.
    ///
    /// `scratch` is private to the calling worker and reused across pixels;
    /// kernels that sort or select copy the column into it.
    fn reduce_pixel(&self, pixel: usize, column: Column<'_>, scratch: &mut Vec<u16>) -> u16;

    /// Rejects stacks this kernel is not defined for.
    ///
    /// Called once before any worker starts; `reduce_pixel` may assume it
    /// passed.
    fn check(&self, _stack: &SampleBuffer) -> Result<()> {
        Ok(())
    }
}

/// Runs `kernel` over every pixel of `stack`, returning a fresh plane.
pub fn run<K: PixelKernel + ?Sized>(
    stack: &SampleBuffer,
    kernel: &K,
    pool: &WorkerPool,
) -> Result<Vec<u16>> {
    kernel.check(stack)?;
    let plane_size = stack.plane_size();
    let mut out = vec![0u16; plane_size];
    let chunk_len = pool.chunk_len(plane_size);
    pool.for_each_chunk(&mut out, chunk_len, |chunk_idx, dst| {
        let base = chunk_idx * chunk_len;
        let mut scratch = Vec::with_capacity(stack.n_images());
        for (offset, value) in dst.iter_mut().enumerate() {
            let pixel = base + offset;
            *value = kernel.reduce_pixel(pixel, stack.column(pixel), &mut scratch);
        }
    });
    Ok(out)
}
