use rawstack::reduce::{
    maximum, mean, median, minimum, range, standard_deviation, summation, trimmed_mean, variance,
};
use rawstack::kernel::scalar::{DeviationKernel, MeanKernel, Spread, TrimmedMeanKernel};
use rawstack::reduce::reduce_with;
use rawstack::{reduce, RawStackError, SampleBuffer, Statistic, WorkerPool};

fn pixel_stack(values: &[u16], max_value: u16) -> SampleBuffer {
    let planes: Vec<[u16; 1]> = values.iter().map(|&v| [v]).collect();
    SampleBuffer::from_planes(&planes, 1, 1, max_value).unwrap()
}

fn ramp(width: usize, height: usize, seed: usize) -> Vec<u16> {
    (0..width * height)
        .map(|i| (((i * 37) ^ (seed * 101) ^ (i * seed)) & 0x0FFF) as u16)
        .collect()
}

#[test]
fn output_has_one_sample_per_pixel() {
    let planes: Vec<Vec<u16>> = (0..4).map(|s| ramp(7, 5, s)).collect();
    let stack = SampleBuffer::from_planes(&planes, 7, 5, 4095).unwrap();
    let pool = WorkerPool::sequential();
    for stat in Statistic::ALL {
        let out = reduce(&stack, stat, &pool).unwrap();
        assert_eq!(out.len(), 35, "{stat}");
        assert_eq!((out.width(), out.height()), (7, 5));
    }
}

#[test]
fn single_image_is_copied() {
    let plane = ramp(6, 4, 3);
    let stack = SampleBuffer::from_planes(&[plane.clone()], 6, 4, 4095).unwrap();
    let pool = WorkerPool::sequential();

    for out in [
        mean(&stack, &pool).unwrap(),
        median(&stack, &pool).unwrap(),
        summation(&stack, &pool).unwrap(),
        minimum(&stack, &pool).unwrap(),
        maximum(&stack, &pool).unwrap(),
        trimmed_mean(&stack, 0, &pool).unwrap(),
    ] {
        assert_eq!(out.as_slice(), plane.as_slice());
    }
    assert!(range(&stack, &pool).unwrap().as_slice().iter().all(|&v| v == 0));
}

#[test]
fn mean_of_constant_stack_is_the_constant() {
    let pool = WorkerPool::sequential();
    for n in [1usize, 2, 3, 10, 33] {
        let planes = vec![vec![1234u16; 12]; n];
        let stack = SampleBuffer::from_planes(&planes, 4, 3, 4095).unwrap();
        let out = mean(&stack, &pool).unwrap();
        assert!(out.as_slice().iter().all(|&v| v == 1234), "n = {n}");
    }
}

#[test]
fn mean_truncates() {
    let stack = pixel_stack(&[1, 2], u16::MAX);
    assert_eq!(mean(&stack, &WorkerPool::sequential()).unwrap().as_slice(), &[1]);
}

#[test]
fn median_of_three() {
    let pool = WorkerPool::sequential();
    for order in [[10u16, 50, 20], [50, 20, 10], [20, 10, 50]] {
        let stack = pixel_stack(&order, u16::MAX);
        assert_eq!(median(&stack, &pool).unwrap().as_slice(), &[20]);
    }
}

#[test]
fn median_of_even_count_is_upper() {
    let stack = pixel_stack(&[4, 1, 3, 2], u16::MAX);
    assert_eq!(median(&stack, &WorkerPool::sequential()).unwrap().as_slice(), &[3]);
}

#[test]
fn median_leaves_stack_untouched() {
    let stack = pixel_stack(&[9, 1, 5], u16::MAX);
    let before = stack.as_slice().to_vec();
    median(&stack, &WorkerPool::sequential()).unwrap();
    assert_eq!(stack.as_slice(), before.as_slice());
}

#[test]
fn summation_saturates_at_white_level() {
    let pool = WorkerPool::sequential();
    let stack = pixel_stack(&[3000, 3000], 4095);
    assert_eq!(summation(&stack, &pool).unwrap().as_slice(), &[4095]);

    let stack = pixel_stack(&[1000, 2000], 4095);
    assert_eq!(summation(&stack, &pool).unwrap().as_slice(), &[3000]);

    let stack = pixel_stack(&[u16::MAX; 40], u16::MAX);
    assert_eq!(summation(&stack, &pool).unwrap().as_slice(), &[u16::MAX]);
}

#[test]
fn range_brackets_every_sample() {
    let planes: Vec<Vec<u16>> = (0..5).map(|s| ramp(9, 9, s + 1)).collect();
    let stack = SampleBuffer::from_planes(&planes, 9, 9, 4095).unwrap();
    let pool = WorkerPool::sequential();

    let lo = minimum(&stack, &pool).unwrap();
    let hi = maximum(&stack, &pool).unwrap();
    let spread = range(&stack, &pool).unwrap();
    for pixel in 0..stack.plane_size() {
        let (min, max) = (lo.as_slice()[pixel], hi.as_slice()[pixel]);
        assert!(min <= max);
        assert_eq!(spread.as_slice()[pixel], max - min);
        for sample in stack.column(pixel).iter() {
            assert!(min <= sample && sample <= max);
        }
    }
}

#[test]
fn range_is_max_minus_min() {
    let stack = pixel_stack(&[400, 250, 300], u16::MAX);
    assert_eq!(range(&stack, &WorkerPool::sequential()).unwrap().as_slice(), &[150]);
}

#[test]
fn variance_uses_bessel_correction() {
    let pool = WorkerPool::sequential();
    let stack = pixel_stack(&[100, 104], u16::MAX);
    assert_eq!(mean(&stack, &pool).unwrap().as_slice(), &[102]);
    assert_eq!(variance(&stack, &pool).unwrap().as_slice(), &[8]);
    assert_eq!(standard_deviation(&stack, &pool).unwrap().as_slice(), &[2]);
}

#[test]
fn variance_saturates() {
    let stack = pixel_stack(&[0, 4095], 4095);
    let out = variance(&stack, &WorkerPool::sequential()).unwrap();
    assert_eq!(out.as_slice(), &[4095]);
}

#[test]
fn std_dev_of_constant_stack_is_zero() {
    let stack = pixel_stack(&[77; 5], u16::MAX);
    let out = standard_deviation(&stack, &WorkerPool::sequential()).unwrap();
    assert_eq!(out.as_slice(), &[0]);
}

#[test]
fn deviation_needs_two_images() {
    let stack = pixel_stack(&[5], u16::MAX);
    let pool = WorkerPool::sequential();
    for stat in [Statistic::Variance, Statistic::StandardDeviation] {
        let err = reduce(&stack, stat, &pool).unwrap_err();
        assert!(
            matches!(err, RawStackError::InsufficientImages { required: 2, got: 1, .. }),
            "{err}"
        );
    }
}

#[test]
fn trimmed_mean_drops_one_per_side() {
    let stack = pixel_stack(&[101, 1, 3, 102, 2, 100], u16::MAX);
    let out = trimmed_mean(&stack, 2, &WorkerPool::sequential()).unwrap();
    assert_eq!(out.as_slice(), &[51]);
}

#[test]
fn trimmed_mean_without_outliers_is_mean() {
    let stack = pixel_stack(&[10, 20, 31], u16::MAX);
    let pool = WorkerPool::sequential();
    assert_eq!(
        trimmed_mean(&stack, 0, &pool).unwrap(),
        mean(&stack, &pool).unwrap()
    );
}

#[test]
fn unknown_statistic_fails_before_reducing() {
    let err = Statistic::from_name("skewness", 0).unwrap_err();
    assert!(matches!(err, RawStackError::UnsupportedStatistic(ref name) if name == "skewness"));
}

#[test]
fn custom_trimmed_kernel_rejects_short_stack() {
    let stack = pixel_stack(&[1, 2, 3], u16::MAX);
    let kernel = TrimmedMeanKernel {
        outliers: 3,
        max_value: u16::MAX,
    };
    for pool in [WorkerPool::sequential(), WorkerPool::new(4).unwrap()] {
        let err = reduce_with(&stack, &kernel, &pool).unwrap_err();
        assert!(
            matches!(
                err,
                RawStackError::InsufficientImages {
                    statistic: "trimmed_mean",
                    required: 4,
                    got: 3
                }
            ),
            "{err}"
        );
    }
}

#[test]
fn custom_deviation_kernel_rejects_single_image() {
    let stack = pixel_stack(&[9], u16::MAX);
    let mean = [9u16];
    let kernel = DeviationKernel {
        mean: &mean,
        spread: Spread::Variance,
        max_value: u16::MAX,
    };
    for pool in [WorkerPool::sequential(), WorkerPool::new(4).unwrap()] {
        let err = reduce_with(&stack, &kernel, &pool).unwrap_err();
        assert!(
            matches!(
                err,
                RawStackError::InsufficientImages {
                    statistic: "variance",
                    required: 2,
                    got: 1
                }
            ),
            "{err}"
        );
    }
}

#[test]
fn custom_deviation_kernel_rejects_short_mean_plane() {
    let planes = [[1u16, 2, 3, 4], [5, 6, 7, 8]];
    let stack = SampleBuffer::from_planes(&planes, 2, 2, u16::MAX).unwrap();
    let mean = [3u16, 4];
    let kernel = DeviationKernel {
        mean: &mean,
        spread: Spread::StdDev,
        max_value: u16::MAX,
    };
    let err = reduce_with(&stack, &kernel, &WorkerPool::sequential()).unwrap_err();
    assert!(matches!(err, RawStackError::PlaneLength { expected: 4, got: 2 }));
}

#[test]
fn custom_kernels_match_reduce_when_valid() {
    let stack = pixel_stack(&[101, 1, 3, 102, 2, 100], u16::MAX);
    let pool = WorkerPool::sequential();
    let kernel = TrimmedMeanKernel {
        outliers: 2,
        max_value: u16::MAX,
    };
    assert_eq!(
        reduce_with(&stack, &kernel, &pool).unwrap(),
        trimmed_mean(&stack, 2, &pool).unwrap()
    );
    assert_eq!(
        reduce_with(&stack, &MeanKernel, &pool).unwrap(),
        mean(&stack, &pool).unwrap()
    );
}
