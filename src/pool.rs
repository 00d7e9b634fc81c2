//! Explicit fork-join worker pool.
//!
//! Every parallel phase in rawstack goes through a [`WorkerPool`]: the caller
//! decides how many workers run, and each call joins all of them before it
//! returns. A pool with one worker runs everything on the calling thread,
//! which tests use to check that results do not depend on scheduling.

#[cfg(feature = "rayon")]
use crate::kernel::rayon::{for_each_chunk_par, map_chunks_par};
use crate::util::{RawStackError, Result};

/// Fixed-size data-parallel worker pool.
pub struct WorkerPool {
    workers: usize,
    #[cfg(feature = "rayon")]
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Creates a pool with `workers` threads; `0` uses every available core.
    ///
    /// Without the `rayon` feature the worker count only shapes chunking and
    /// all work runs on the calling thread.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 1 {
            return Ok(Self::sequential());
        }
        Self::with_threads(workers)
    }

    #[cfg(feature = "rayon")]
    fn with_threads(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Ok(Self {
                workers: rayon::current_num_threads().max(1),
                pool: None,
            });
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("rawstack-worker-{idx}"))
            .build()
            .map_err(|err| RawStackError::WorkerPool(err.to_string()))?;
        Ok(Self {
            workers,
            pool: Some(pool),
        })
    }

    #[cfg(not(feature = "rayon"))]
    fn with_threads(workers: usize) -> Result<Self> {
        let workers = match workers {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .map_err(|err| RawStackError::WorkerPool(err.to_string()))?,
            n => n,
        };
        Ok(Self { workers })
    }

    /// A single-worker pool that runs on the calling thread.
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            #[cfg(feature = "rayon")]
            pool: None,
        }
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Length of the static chunks `len` items are split into, one per worker.
    pub fn chunk_len(&self, len: usize) -> usize {
        len.div_ceil(self.workers).max(1)
    }

    /// Runs `f(chunk_index, chunk)` over `chunk_len` chunks of `data` and
    /// returns the results in chunk order after all chunks finished.
    pub(crate) fn map_chunks<T, R, F>(&self, data: &mut [T], chunk_len: usize, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, &mut [T]) -> R + Sync + Send,
    {
        #[cfg(feature = "rayon")]
        if self.workers > 1 {
            return match &self.pool {
                Some(pool) => pool.install(|| map_chunks_par(data, chunk_len, f)),
                None => map_chunks_par(data, chunk_len, f),
            };
        }
        data.chunks_mut(chunk_len)
            .enumerate()
            .map(|(idx, chunk)| f(idx, chunk))
            .collect()
    }

    /// Runs `f(chunk_index, chunk)` over `chunk_len` chunks of `data`.
    pub(crate) fn for_each_chunk<T, F>(&self, data: &mut [T], chunk_len: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        #[cfg(feature = "rayon")]
        if self.workers > 1 {
            match &self.pool {
                Some(pool) => pool.install(|| for_each_chunk_par(data, chunk_len, f)),
                None => for_each_chunk_par(data, chunk_len, f),
            }
            return;
        }
        for (idx, chunk) in data.chunks_mut(chunk_len).enumerate() {
            f(idx, chunk);
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::sequential()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerPool;

    #[test]
    fn chunk_len_covers_every_item() {
        let pool = WorkerPool::new(4).unwrap();
        assert_eq!(pool.chunk_len(10), 3);
        assert_eq!(pool.chunk_len(8), 2);
        assert_eq!(pool.chunk_len(0), 1);
        assert_eq!(WorkerPool::sequential().chunk_len(10), 10);
    }

    #[test]
    fn map_chunks_keeps_chunk_order() {
        let pool = WorkerPool::new(3).unwrap();
        let mut data: Vec<u32> = (0..10).collect();
        let chunk_len = pool.chunk_len(data.len());
        let sums = pool.map_chunks(&mut data, chunk_len, |idx, chunk| {
            for v in chunk.iter_mut() {
                *v += 1;
            }
            (idx, chunk.iter().sum::<u32>())
        });
        assert_eq!(sums, vec![(0, 10), (1, 26), (2, 19)]);
        assert_eq!(data, (1..11).collect::<Vec<_>>());
    }

    #[test]
    fn zero_workers_means_all_cores() {
        let pool = WorkerPool::new(0).unwrap();
        assert!(pool.workers() >= 1);
    }
}
