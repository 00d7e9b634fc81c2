//! Error types for rawstack.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::decode::DecodeError;

/// Result alias for rawstack operations.
pub type Result<T> = std::result::Result<T, RawStackError>;

/// A single file that failed to decode while building a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFailure {
    /// Position of the file in the input list.
    pub index: usize,
    /// Path of the file that failed.
    pub path: PathBuf,
    /// What went wrong.
    pub error: DecodeError,
}

impl std::fmt::Display for IngestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} '{}': {}", self.index, self.path.display(), self.error)
    }
}

/// Errors that can occur when building stacks, reducing them, or patching output.
#[derive(Debug, Error)]
pub enum RawStackError {
    /// No input files were given, or a directory held no candidate files.
    #[error("no input files")]
    NoInputs,
    /// Width, height or image count is zero, or the total size overflows.
    #[error("invalid dimensions: {width}x{height} x {n_images} images")]
    InvalidDimensions {
        width: usize,
        height: usize,
        n_images: usize,
    },
    /// A plane does not hold exactly `width * height` samples.
    #[error("plane length mismatch: expected {expected} samples, got {got}")]
    PlaneLength { expected: usize, got: usize },
    /// One or more files failed to decode; all attempts were made first.
    #[error("{} of {total} input files failed to decode: {}", failures.len(), join_failures(failures))]
    Ingest {
        total: usize,
        failures: Vec<IngestFailure>,
    },
    /// Listing an input directory failed.
    #[error("cannot read directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The statistic name is not one rawstack knows.
    #[error("unsupported statistic '{0}'")]
    UnsupportedStatistic(String),
    /// The statistic needs more images than the stack holds.
    #[error("{statistic} needs at least {required} images, stack has {got}")]
    InsufficientImages {
        statistic: &'static str,
        required: usize,
        got: usize,
    },
    /// A stack index is outside the stack.
    #[error("index {index} out of bounds for {context} (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// The reference container could not be read.
    #[error("cannot open reference file '{path}': {source}")]
    CannotOpenReference {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The original samples were not found verbatim in the reference container.
    #[error("reference file '{path}' may be compressed: its raw samples were not found verbatim; use an uncompressed reference file")]
    MayBeCompressed { path: PathBuf },
    /// Writing the patched container failed.
    #[error("cannot write output file '{path}': {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The worker pool could not be created.
    #[error("cannot build worker pool: {0}")]
    WorkerPool(String),
    /// Image encoding failed (preview export).
    #[error("image i/o error: {reason}")]
    ImageIo { reason: String },
}

impl RawStackError {
    /// Returns true for expected outcomes that callers should present as an
    /// unsupported-input message rather than an internal failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RawStackError::MayBeCompressed { .. })
    }
}

fn join_failures(failures: &[IngestFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
