//! RawStack reduces a stack of same-sized raw sensor images to one image,
//! pixel by pixel, and writes the result back into a copy of one of the
//! source raw files.
//!
//! Decoding is delegated to a [`RawDecoder`]; the crate itself never parses a
//! camera container. Reductions run on an injectable [`WorkerPool`], with
//! optional parallelism via the `rayon` feature (enabled by default).

mod trace;

pub mod decode;
pub mod kernel;
pub mod patch;
pub mod pipeline;
pub mod plane;
pub mod pool;
pub mod reduce;
pub mod stack;
pub mod util;

#[cfg(feature = "image-io")]
pub use plane::io;

#[cfg(feature = "libraw")]
pub use decode::LibRawDecoder;
pub use decode::{DecodeError, RawDecoder, RawDumpDecoder, RawInfo};
pub use kernel::PixelKernel;
pub use patch::{default_output_path, patch_and_write, PatchReport};
pub use pipeline::{StackConfig, StackReport, Stacker};
pub use plane::{OutputPlane, PlaneStats};
pub use pool::WorkerPool;
pub use reduce::{reduce, reduce_with, Statistic};
pub use stack::{Column, SampleBuffer};
pub use util::{IngestFailure, RawStackError, Result, Timer};
