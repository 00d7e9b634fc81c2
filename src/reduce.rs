//! Statistic selection and reduction entry points.
//!
//! [`reduce`] is the single dispatch point: it checks the statistic's
//! preconditions against the stack before any parallel work starts, then runs
//! the matching kernel. Variance and standard deviation are two-pass: the
//! mean plane is computed (and joined) first and dropped before returning.

use std::fmt;
use std::str::FromStr;

use crate::kernel::scalar::{
    DeviationKernel, MaxKernel, MeanKernel, MedianKernel, MinKernel, RangeKernel, Spread,
    SumKernel, TrimmedMeanKernel,
};
use crate::kernel::{run, PixelKernel};
use crate::plane::OutputPlane;
use crate::pool::WorkerPool;
use crate::stack::SampleBuffer;
use crate::trace::{trace_event, trace_span};
use crate::util::{RawStackError, Result, Timer};

/// Pixel-wise statistic to reduce a stack with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Statistic {
    Mean,
    Median,
    Summation,
    Maximum,
    Minimum,
    Range,
    /// Bessel-corrected sample variance, clamped to the sample range.
    Variance,
    StandardDeviation,
    /// Mean after dropping `outliers / 2` samples from each end.
    TrimmedMean { outliers: usize },
}

impl Statistic {
    /// Every statistic, with a trimmed mean of two outliers.
    pub const ALL: [Statistic; 9] = [
        Statistic::Mean,
        Statistic::Median,
        Statistic::Summation,
        Statistic::Maximum,
        Statistic::Minimum,
        Statistic::Range,
        Statistic::Variance,
        Statistic::StandardDeviation,
        Statistic::TrimmedMean { outliers: 2 },
    ];

    /// Canonical snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Summation => "summation",
            Statistic::Maximum => "maximum",
            Statistic::Minimum => "minimum",
            Statistic::Range => "range",
            Statistic::Variance => "variance",
            Statistic::StandardDeviation => "standard_deviation",
            Statistic::TrimmedMean { .. } => "trimmed_mean",
        }
    }

    /// Smallest stack this statistic is defined for.
    pub fn min_images(&self) -> usize {
        match self {
            Statistic::Variance | Statistic::StandardDeviation => 2,
            Statistic::TrimmedMean { outliers } => outliers.saturating_add(1),
            _ => 1,
        }
    }

    /// Parses a statistic name, using `trim` as the outlier count for a
    /// trimmed mean that does not carry its own (`trimmed_mean:N`).
    pub fn from_name(name: &str, trim: usize) -> Result<Self> {
        let lowered = name.trim().to_ascii_lowercase().replace('-', "_");
        let (base, count) = match lowered.split_once(':') {
            Some((base, count)) => {
                let count = count
                    .parse()
                    .map_err(|_| RawStackError::UnsupportedStatistic(name.to_string()))?;
                (base, Some(count))
            }
            None => (lowered.as_str(), None),
        };
        let stat = match base {
            "mean" | "average" | "avg" => Statistic::Mean,
            "median" => Statistic::Median,
            "summation" | "sum" => Statistic::Summation,
            "maximum" | "max" => Statistic::Maximum,
            "minimum" | "min" => Statistic::Minimum,
            "range" => Statistic::Range,
            "variance" | "var" => Statistic::Variance,
            "standard_deviation" | "stddev" | "std" => Statistic::StandardDeviation,
            "trimmed_mean" | "mean_remove_outlier" => Statistic::TrimmedMean {
                outliers: count.unwrap_or(trim),
            },
            _ => return Err(RawStackError::UnsupportedStatistic(name.to_string())),
        };
        if count.is_some() && !matches!(stat, Statistic::TrimmedMean { .. }) {
            return Err(RawStackError::UnsupportedStatistic(name.to_string()));
        }
        Ok(stat)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::TrimmedMean { outliers } => write!(f, "trimmed_mean:{outliers}"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for Statistic {
    type Err = RawStackError;

    fn from_str(s: &str) -> Result<Self> {
        Statistic::from_name(s, 0)
    }
}

/// Reduces `stack` to one plane with `statistic`.
pub fn reduce(stack: &SampleBuffer, statistic: Statistic, pool: &WorkerPool) -> Result<OutputPlane> {
    check_images(stack, statistic)?;
    let _span = trace_span!(
        "reduce",
        statistic = statistic.name(),
        n_images = stack.n_images(),
        workers = pool.workers()
    )
    .entered();
    let timer = Timer::start();

    let data = match statistic {
        Statistic::Mean => run(stack, &MeanKernel, pool)?,
        Statistic::Median => run(stack, &MedianKernel, pool)?,
        Statistic::Summation => run(
            stack,
            &SumKernel {
                max_value: stack.max_value(),
            },
            pool,
        )?,
        Statistic::Maximum => run(stack, &MaxKernel, pool)?,
        Statistic::Minimum => run(stack, &MinKernel, pool)?,
        Statistic::Range => run(stack, &RangeKernel, pool)?,
        Statistic::Variance => deviation(stack, Spread::Variance, pool)?,
        Statistic::StandardDeviation => deviation(stack, Spread::StdDev, pool)?,
        Statistic::TrimmedMean { outliers } => run(
            stack,
            &TrimmedMeanKernel {
                outliers,
                max_value: stack.max_value(),
            },
            pool,
        )?,
    };

    trace_event!("reduced", statistic = statistic.name(), ms = timer.elapsed_ms());
    OutputPlane::new(data, stack.width(), stack.height())
}

/// Runs a caller-supplied kernel over `stack`.
///
/// The kernel's own [`PixelKernel::check`] runs first, so a stack the kernel
/// is not defined for is an error, not a worker panic.
pub fn reduce_with<K: PixelKernel>(
    stack: &SampleBuffer,
    kernel: &K,
    pool: &WorkerPool,
) -> Result<OutputPlane> {
    OutputPlane::new(run(stack, kernel, pool)?, stack.width(), stack.height())
}

/// Truncating per-pixel mean.
pub fn mean(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::Mean, pool)
}

/// Upper median per pixel.
pub fn median(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::Median, pool)
}

/// Per-pixel sum saturated at the stack's `max_value`.
pub fn summation(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::Summation, pool)
}

/// Largest sample per pixel.
pub fn maximum(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::Maximum, pool)
}

/// Smallest sample per pixel.
pub fn minimum(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::Minimum, pool)
}

/// Per-pixel `max - min`; zero for a single image.
pub fn range(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::Range, pool)
}

/// Sample variance; needs two or more images.
pub fn variance(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::Variance, pool)
}

/// Integer square root of the sample variance; needs two or more images.
pub fn standard_deviation(stack: &SampleBuffer, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::StandardDeviation, pool)
}

/// Mean without the `outliers / 2` smallest and largest samples per pixel.
pub fn trimmed_mean(stack: &SampleBuffer, outliers: usize, pool: &WorkerPool) -> Result<OutputPlane> {
    reduce(stack, Statistic::TrimmedMean { outliers }, pool)
}

fn check_images(stack: &SampleBuffer, statistic: Statistic) -> Result<()> {
    let required = statistic.min_images();
    if stack.n_images() < required {
        return Err(RawStackError::InsufficientImages {
            statistic: statistic.name(),
            required,
            got: stack.n_images(),
        });
    }
    Ok(())
}

fn deviation(stack: &SampleBuffer, spread: Spread, pool: &WorkerPool) -> Result<Vec<u16>> {
    let mean = run(stack, &MeanKernel, pool)?;
    run(
        stack,
        &DeviationKernel {
            mean: &mean,
            spread,
            max_value: stack.max_value(),
        },
        pool,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_aliases_parse() {
        assert_eq!("avg".parse::<Statistic>().unwrap(), Statistic::Mean);
        assert_eq!("SUM".parse::<Statistic>().unwrap(), Statistic::Summation);
        assert_eq!("std".parse::<Statistic>().unwrap(), Statistic::StandardDeviation);
        assert_eq!(
            "standard-deviation".parse::<Statistic>().unwrap(),
            Statistic::StandardDeviation
        );
        assert_eq!(
            "trimmed_mean:4".parse::<Statistic>().unwrap(),
            Statistic::TrimmedMean { outliers: 4 }
        );
        assert_eq!(
            Statistic::from_name("trimmed_mean", 6).unwrap(),
            Statistic::TrimmedMean { outliers: 6 }
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for stat in Statistic::ALL {
            assert_eq!(stat.to_string().parse::<Statistic>().unwrap(), stat);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        for name in ["skewness", "kurtosis", "entropy", "none", "", "mean:2"] {
            let err = name.parse::<Statistic>().unwrap_err();
            assert!(matches!(err, RawStackError::UnsupportedStatistic(_)), "{name}");
        }
    }

    #[test]
    fn variance_needs_two_images() {
        let stack = SampleBuffer::from_planes(&[[5u16, 6]], 2, 1, u16::MAX).unwrap();
        let err = variance(&stack, &WorkerPool::sequential()).unwrap_err();
        assert!(matches!(
            err,
            RawStackError::InsufficientImages {
                statistic: "variance",
                required: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn trim_must_leave_a_sample() {
        let stack = SampleBuffer::from_planes(&[[1u16], [2], [3]], 1, 1, u16::MAX).unwrap();
        let pool = WorkerPool::sequential();
        assert!(trimmed_mean(&stack, 2, &pool).is_ok());
        let err = trimmed_mean(&stack, 3, &pool).unwrap_err();
        assert!(matches!(err, RawStackError::InsufficientImages { required: 4, .. }));
    }
}
