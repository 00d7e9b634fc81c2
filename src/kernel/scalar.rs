//! Scalar per-pixel kernels for every supported statistic.
//!
//! Sums are carried in `u64`, wide enough for any realistic stack of 16-bit
//! samples, and narrowed back with saturation at the stack's `max_value`
//! wherever the result can leave the sample range.

use crate::kernel::PixelKernel;
use crate::stack::{Column, SampleBuffer};
use crate::util::math::{isqrt_u64, saturate};
use crate::util::{RawStackError, Result};

/// Truncating arithmetic mean.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanKernel;

impl PixelKernel for MeanKernel {
    #[inline]
    fn reduce_pixel(&self, _pixel: usize, column: Column<'_>, _scratch: &mut Vec<u16>) -> u16 {
        let sum: u64 = column.iter().map(u64::from).sum();
        (sum / column.len() as u64) as u16
    }
}

/// Upper median: element `n / 2` in sorted order, never averaged.
#[derive(Clone, Copy, Debug, Default)]
pub struct MedianKernel;

impl PixelKernel for MedianKernel {
    #[inline]
    fn reduce_pixel(&self, _pixel: usize, column: Column<'_>, scratch: &mut Vec<u16>) -> u16 {
        scratch.clear();
        scratch.extend(column.iter());
        let mid = scratch.len() / 2;
        *scratch.select_nth_unstable(mid).1
    }
}

/// Sum saturated at `max_value`.
#[derive(Clone, Copy, Debug)]
pub struct SumKernel {
    pub max_value: u16,
}

impl PixelKernel for SumKernel {
    #[inline]
    fn reduce_pixel(&self, _pixel: usize, column: Column<'_>, _scratch: &mut Vec<u16>) -> u16 {
        let sum: u64 = column.iter().map(u64::from).sum();
        saturate(sum, self.max_value)
    }
}

/// Largest sample per pixel.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxKernel;

impl PixelKernel for MaxKernel {
    #[inline]
    fn reduce_pixel(&self, _pixel: usize, column: Column<'_>, _scratch: &mut Vec<u16>) -> u16 {
        column.iter().fold(0, u16::max)
    }
}

/// Smallest sample per pixel; the running minimum starts at `u16::MAX`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinKernel;

impl PixelKernel for MinKernel {
    #[inline]
    fn reduce_pixel(&self, _pixel: usize, column: Column<'_>, _scratch: &mut Vec<u16>) -> u16 {
        column.iter().fold(u16::MAX, u16::min)
    }
}

/// `max - min` in a single pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeKernel;

impl PixelKernel for RangeKernel {
    #[inline]
    fn reduce_pixel(&self, _pixel: usize, column: Column<'_>, _scratch: &mut Vec<u16>) -> u16 {
        let (lo, hi) = column
            .iter()
            .fold((u16::MAX, 0u16), |(lo, hi), v| (lo.min(v), hi.max(v)));
        hi - lo
    }
}

/// What [`DeviationKernel`] reports from the Bessel-corrected variance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Spread {
    Variance,
    StdDev,
}

/// Second pass of variance / standard deviation against a precomputed mean plane.
///
/// Requires at least two images; callers check this before running.
#[derive(Clone, Copy, Debug)]
pub struct DeviationKernel<'a> {
    pub mean: &'a [u16],
    pub spread: Spread,
    pub max_value: u16,
}

impl PixelKernel for DeviationKernel<'_> {
    #[inline]
    fn reduce_pixel(&self, pixel: usize, column: Column<'_>, _scratch: &mut Vec<u16>) -> u16 {
        let mean = i64::from(self.mean[pixel]);
        let sum_sq: u64 = column
            .iter()
            .map(|v| {
                let delta = i64::from(v) - mean;
                (delta * delta) as u64
            })
            .sum();
        let variance = sum_sq / (column.len() as u64 - 1);
        match self.spread {
            Spread::Variance => saturate(variance, self.max_value),
            Spread::StdDev => saturate(isqrt_u64(variance), self.max_value),
        }
    }

    fn check(&self, stack: &SampleBuffer) -> Result<()> {
        if stack.n_images() < 2 {
            return Err(RawStackError::InsufficientImages {
                statistic: match self.spread {
                    Spread::Variance => "variance",
                    Spread::StdDev => "standard_deviation",
                },
                required: 2,
                got: stack.n_images(),
            });
        }
        if self.mean.len() != stack.plane_size() {
            return Err(RawStackError::PlaneLength {
                expected: stack.plane_size(),
                got: self.mean.len(),
            });
        }
        Ok(())
    }
}

/// Mean after sorting and dropping `outliers / 2` samples from each end.
///
/// The divisor is `n - outliers`, so an odd count keeps one more sample than
/// the divisor accounts for. Requires `outliers < n`.
#[derive(Clone, Copy, Debug)]
pub struct TrimmedMeanKernel {
    pub outliers: usize,
    pub max_value: u16,
}

impl PixelKernel for TrimmedMeanKernel {
    #[inline]
    fn reduce_pixel(&self, _pixel: usize, column: Column<'_>, scratch: &mut Vec<u16>) -> u16 {
        scratch.clear();
        scratch.extend(column.iter());
        scratch.sort_unstable();
        let n = scratch.len();
        let per_side = self.outliers / 2;
        let sum: u64 = scratch[per_side..n - per_side]
            .iter()
            .copied()
            .map(u64::from)
            .sum();
        saturate(sum / (n - self.outliers) as u64, self.max_value)
    }

    fn check(&self, stack: &SampleBuffer) -> Result<()> {
        let required = self.outliers.saturating_add(1);
        if stack.n_images() < required {
            return Err(RawStackError::InsufficientImages {
                statistic: "trimmed_mean",
                required,
                got: stack.n_images(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_of(values: &[u16]) -> SampleBuffer {
        let planes: Vec<[u16; 1]> = values.iter().map(|&v| [v]).collect();
        SampleBuffer::from_planes(&planes, 1, 1, u16::MAX).unwrap()
    }

    fn apply<K: PixelKernel>(kernel: &K, values: &[u16]) -> u16 {
        let stack = column_of(values);
        let mut scratch = Vec::new();
        kernel.reduce_pixel(0, stack.column(0), &mut scratch)
    }

    #[test]
    fn mean_truncates() {
        assert_eq!(apply(&MeanKernel, &[1, 2]), 1);
        assert_eq!(apply(&MeanKernel, &[65535, 65535, 65535]), 65535);
    }

    #[test]
    fn median_picks_upper_middle() {
        assert_eq!(apply(&MedianKernel, &[10, 50, 20]), 20);
        assert_eq!(apply(&MedianKernel, &[4, 1, 3, 2]), 3);
    }

    #[test]
    fn sum_saturates_at_max_value() {
        let kernel = SumKernel { max_value: 4095 };
        assert_eq!(apply(&kernel, &[4000, 4000]), 4095);
        assert_eq!(apply(&kernel, &[1000, 2000]), 3000);
    }

    #[test]
    fn range_does_not_start_min_at_zero() {
        assert_eq!(apply(&RangeKernel, &[300, 500, 400]), 200);
        assert_eq!(apply(&RangeKernel, &[7]), 0);
    }

    #[test]
    fn min_and_max_bound_the_column() {
        assert_eq!(apply(&MinKernel, &[9, 3, 65535]), 3);
        assert_eq!(apply(&MaxKernel, &[9, 3, 65535]), 65535);
    }

    #[test]
    fn deviation_uses_bessel_correction() {
        let mean = [102u16];
        let variance = DeviationKernel {
            mean: &mean,
            spread: Spread::Variance,
            max_value: u16::MAX,
        };
        assert_eq!(apply(&variance, &[100, 104]), 8);
        let std = DeviationKernel {
            spread: Spread::StdDev,
            ..variance
        };
        assert_eq!(apply(&std, &[100, 104]), 2);
    }

    #[test]
    fn deviation_clamps_large_variance() {
        let mean = [32767u16];
        let kernel = DeviationKernel {
            mean: &mean,
            spread: Spread::Variance,
            max_value: u16::MAX,
        };
        assert_eq!(apply(&kernel, &[0, 65535]), u16::MAX);
    }

    #[test]
    fn trimmed_mean_drops_extremes() {
        let kernel = TrimmedMeanKernel {
            outliers: 2,
            max_value: u16::MAX,
        };
        assert_eq!(apply(&kernel, &[101, 1, 3, 102, 2, 100]), 51);
    }

    #[test]
    fn odd_trim_keeps_one_extra_sample() {
        let kernel = TrimmedMeanKernel {
            outliers: 3,
            max_value: u16::MAX,
        };
        // Drops one per side, keeps {2, 3, 4}, divides by 5 - 3.
        assert_eq!(apply(&kernel, &[1, 2, 3, 4, 5]), 4);
    }
}
