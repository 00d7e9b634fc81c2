//! Rayon-parallel chunk drivers (feature-gated).
//!
//! Both ingestion and reduction reduce to the same shape: a mutable buffer cut
//! into fixed-size chunks, each chunk handed to exactly one task. Chunks are
//! disjoint `&mut` slices, so tasks share nothing mutable and need no locks.
//! `collect` keeps results in chunk order regardless of scheduling.

use rayon::prelude::*;

/// Runs `f` on every `chunk_len` chunk of `data` in parallel, returning
/// results in chunk order.
pub(crate) fn map_chunks_par<T, R, F>(data: &mut [T], chunk_len: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut [T]) -> R + Sync + Send,
{
    data.par_chunks_mut(chunk_len)
        .enumerate()
        .map(|(idx, chunk)| f(idx, chunk))
        .collect()
}

/// Runs `f` on every `chunk_len` chunk of `data` in parallel.
pub(crate) fn for_each_chunk_par<T, F>(data: &mut [T], chunk_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    data.par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(idx, chunk)| f(idx, chunk));
}
