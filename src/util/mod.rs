//! Shared utility helpers.

pub mod error;
pub(crate) mod math;
pub mod timer;

pub use error::{IngestFailure, RawStackError, Result};
pub use timer::Timer;
