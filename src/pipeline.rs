//! One stacking request end to end: decode, reduce, patch.

use std::path::{Path, PathBuf};

use crate::decode::RawDecoder;
use crate::patch::{default_output_path, patch_and_write, PatchReport};
use crate::plane::OutputPlane;
use crate::pool::WorkerPool;
use crate::reduce::{reduce, Statistic};
use crate::stack::{expand_inputs, SampleBuffer};
use crate::trace::{trace_event, trace_span};
use crate::util::{RawStackError, Result, Timer};

/// Configuration for a [`Stacker`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackConfig {
    /// Statistic to reduce with.
    pub statistic: Statistic,
    /// Worker threads; `0` uses every available core.
    pub workers: usize,
    /// Which input file serves as the output container template.
    pub reference_index: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            statistic: Statistic::Mean,
            workers: 0,
            reference_index: 0,
        }
    }
}

/// What a stacking run did.
#[derive(Clone, Debug, PartialEq)]
pub struct StackReport {
    pub statistic: Statistic,
    pub n_images: usize,
    pub width: usize,
    pub height: usize,
    pub max_value: u16,
    /// Container the output was patched into.
    pub reference: PathBuf,
    pub destination: PathBuf,
    pub patch: PatchReport,
    pub read_ms: f64,
    pub reduce_ms: f64,
    pub write_ms: f64,
}

/// Runs stacking requests with one configuration and one worker pool.
#[derive(Debug)]
pub struct Stacker {
    config: StackConfig,
    pool: WorkerPool,
}

impl Stacker {
    /// Creates a stacker, building its worker pool.
    pub fn new(config: StackConfig) -> Result<Self> {
        let pool = WorkerPool::new(config.workers)?;
        Ok(Self { config, pool })
    }

    /// Uses an existing pool instead of building one.
    pub fn with_pool(config: StackConfig, pool: WorkerPool) -> Self {
        Self { config, pool }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Decodes `files` into a stack.
    pub fn build<P, D>(&self, files: &[P], decoder: &D) -> Result<SampleBuffer>
    where
        P: AsRef<Path> + Sync,
        D: RawDecoder + ?Sized,
    {
        SampleBuffer::from_files(files, decoder, &self.pool)
    }

    /// Reduces `stack` with the configured statistic.
    pub fn reduce(&self, stack: &SampleBuffer) -> Result<OutputPlane> {
        reduce(stack, self.config.statistic, &self.pool)
    }

    /// Stacks `inputs` and writes the result into a copy of the reference
    /// input at `destination`, or at [`default_output_path`] of the
    /// reference when `destination` is `None`.
    ///
    /// A single directory input is expanded to its candidate files.
    pub fn run<D>(
        &self,
        inputs: &[PathBuf],
        decoder: &D,
        destination: Option<&Path>,
    ) -> Result<(OutputPlane, StackReport)>
    where
        D: RawDecoder + ?Sized,
    {
        let files = expand_inputs(inputs, decoder)?;
        let reference_index = self.config.reference_index;
        let reference = files
            .get(reference_index)
            .cloned()
            .ok_or(RawStackError::IndexOutOfBounds {
                index: reference_index,
                len: files.len(),
                context: "reference file",
            })?;
        let destination = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(&reference));
        let _span = trace_span!(
            "stack",
            files = files.len(),
            statistic = self.config.statistic.name()
        )
        .entered();

        let mut timer = Timer::start();
        let stack = self.build(&files, decoder)?;
        let read_ms = timer.stop();

        let output = self.reduce(&stack)?;
        let reduce_ms = timer.stop();

        let original = stack
            .plane(reference_index)
            .ok_or(RawStackError::IndexOutOfBounds {
                index: reference_index,
                len: stack.n_images(),
                context: "reference plane",
            })?;
        let patch = patch_and_write(
            &reference,
            &destination,
            output.as_slice(),
            original,
            stack.width(),
            stack.height(),
        )?;
        let write_ms = timer.stop();

        trace_event!(
            "stack_written",
            read_ms = read_ms,
            reduce_ms = reduce_ms,
            write_ms = write_ms,
            offset = patch.offset
        );

        let report = StackReport {
            statistic: self.config.statistic,
            n_images: stack.n_images(),
            width: stack.width(),
            height: stack.height(),
            max_value: stack.max_value(),
            reference,
            destination,
            patch,
            read_ms,
            reduce_ms,
            write_ms,
        };
        Ok((output, report))
    }
}
