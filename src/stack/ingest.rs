//! Building a stack from files through a [`RawDecoder`].
//!
//! Decoding dominates the cost of a stacking request, so every file is
//! decoded even after a sibling fails: failures are collected per file and
//! reported together once all workers have joined. The stack is either
//! complete or not returned at all.

use std::fs;
use std::path::{Path, PathBuf};

use crate::decode::RawDecoder;
use crate::pool::WorkerPool;
use crate::stack::{total_size, SampleBuffer};
use crate::trace::{trace_debug, trace_event, trace_span, trace_warn};
use crate::util::{IngestFailure, RawStackError, Result};

impl SampleBuffer {
    /// Decodes `files` in parallel into one stack.
    ///
    /// Dimensions and white level come from probing the first file; every
    /// file must decode to the same dimensions.
    pub fn from_files<P, D>(files: &[P], decoder: &D, pool: &WorkerPool) -> Result<Self>
    where
        P: AsRef<Path> + Sync,
        D: RawDecoder + ?Sized,
    {
        let first = files.first().ok_or(RawStackError::NoInputs)?;
        let _span = trace_span!("build_stack", files = files.len()).entered();

        let info = decoder.probe(first.as_ref()).map_err(|error| RawStackError::Ingest {
            total: files.len(),
            failures: vec![IngestFailure {
                index: 0,
                path: first.as_ref().to_path_buf(),
                error,
            }],
        })?;
        let (width, height) = (info.width, info.height);
        let total = total_size(width, height, files.len())?;
        let plane_size = width * height;

        let mut data = vec![0u16; total];
        let outcomes = pool.map_chunks(&mut data, plane_size, |index, plane| {
            let path = files[index].as_ref();
            let outcome = decoder.decode_plane(path, width, height, plane);
            trace_debug!("plane_decoded", index = index, ok = outcome.is_ok());
            outcome.err().map(|error| IngestFailure {
                index,
                path: path.to_path_buf(),
                error,
            })
        });

        let failures: Vec<IngestFailure> = outcomes.into_iter().flatten().collect();
        if !failures.is_empty() {
            trace_warn!("build_stack_failed", failed = failures.len());
            return Err(RawStackError::Ingest {
                total: files.len(),
                failures,
            });
        }

        trace_event!(
            "stack_built",
            width = width,
            height = height,
            n_images = files.len(),
            max_value = info.max_value
        );
        SampleBuffer::from_vec(data, width, height, files.len(), info.max_value)
    }

    /// Builds a stack from every candidate file in `dir`, in path order.
    pub fn from_directory<D>(dir: &Path, decoder: &D, pool: &WorkerPool) -> Result<Self>
    where
        D: RawDecoder + ?Sized,
    {
        let files = list_directory(dir, decoder)?;
        Self::from_files(&files, decoder, pool)
    }
}

/// Regular files in `dir` that `decoder` accepts, sorted lexicographically.
pub fn list_directory<D>(dir: &Path, decoder: &D) -> Result<Vec<PathBuf>>
where
    D: RawDecoder + ?Sized,
{
    let read_err = |source| RawStackError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if path.is_file() && decoder.is_candidate(&path) {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        return Err(RawStackError::NoInputs);
    }
    Ok(files)
}

/// Expands a single directory argument into its files; other lists pass through.
pub fn expand_inputs<D>(inputs: &[PathBuf], decoder: &D) -> Result<Vec<PathBuf>>
where
    D: RawDecoder + ?Sized,
{
    match inputs {
        [] => Err(RawStackError::NoInputs),
        [single] if single.is_dir() => list_directory(single, decoder),
        many => Ok(many.to_vec()),
    }
}
