//! Tracing hooks for the stacking phases.
//!
//! With the `tracing` feature these forward to `tracing`; without it they
//! evaluate their field values and discard them.
//!
//! Levels follow what a stacking run reports:
//! - `trace_span!`: one info span per phase (ingest, reduce, patch, run).
//! - `trace_event!`: info events with phase totals and timings.
//! - `trace_debug!`: per-file detail emitted from ingestion workers.
//! - `trace_warn!`: outcomes the caller is about to receive as an error.

#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::PhaseGuard
    };
}

#[cfg(feature = "tracing")]
macro_rules! trace_at {
    ($level:ident, $name:expr) => {
        tracing::$level!(name: $name, "{}", $name)
    };
    ($level:ident, $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::$level!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_at {
    ($level:ident, $name:expr $(, $key:ident = $value:expr)* $(,)?) => {
        let _ = ($($value,)*);
    };
}

macro_rules! trace_event {
    ($($args:tt)+) => {
        $crate::trace::trace_at!(info, $($args)+)
    };
}

macro_rules! trace_debug {
    ($($args:tt)+) => {
        $crate::trace::trace_at!(debug, $($args)+)
    };
}

macro_rules! trace_warn {
    ($($args:tt)+) => {
        $crate::trace::trace_at!(warn, $($args)+)
    };
}

pub(crate) use trace_at;
pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Span guard returned by `trace_span!(..).entered()` when tracing is off.
#[cfg(not(feature = "tracing"))]
pub(crate) struct PhaseGuard;

#[cfg(not(feature = "tracing"))]
impl PhaseGuard {
    #[inline]
    pub(crate) fn entered(self) -> Self {
        self
    }
}
