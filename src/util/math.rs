//! Integer helpers for the reduction kernels.

/// Floor of the square root of `value`.
pub(crate) fn isqrt_u64(value: u64) -> u64 {
    if value < 2 {
        return value;
    }
    // The f64 estimate can be off by one either way for large inputs.
    let mut root = (value as f64).sqrt() as u64;
    while root.checked_mul(root).map_or(true, |sq| sq > value) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).map_or(false, |sq| sq <= value) {
        root += 1;
    }
    root
}

/// Narrows a wide accumulator to a sample, saturating at `max_value`.
#[inline]
pub(crate) fn saturate(value: u64, max_value: u16) -> u16 {
    value.min(max_value as u64) as u16
}
