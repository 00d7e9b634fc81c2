//! Decoder seam between vendor raw formats and the sample stack.
//!
//! Stacking only needs two things from a decoder: the sensor dimensions of a
//! file and its unpacked samples written into a caller-provided plane. The
//! [`RawDecoder`] trait captures exactly that, so stacks can be built from
//! LibRaw (feature `libraw`), from fixed-layout dumps ([`RawDumpDecoder`]), or
//! from any in-memory source in tests.

use std::path::Path;

use thiserror::Error;

pub mod dump;
#[cfg(feature = "libraw")]
pub mod libraw;

pub use dump::RawDumpDecoder;
#[cfg(feature = "libraw")]
pub use libraw::LibRawDecoder;

/// File extensions of camera raw formats, lowercase.
pub const RAW_EXTENSIONS: &[&str] = &[
    "3fr", "ari", "arw", "bay", "cr2", "cr3", "crw", "dcr", "dng", "erf", "fff", "iiq", "k25",
    "kdc", "mef", "mos", "mrw", "nef", "nrw", "orf", "pef", "raf", "raw", "rw2", "rwl", "sr2",
    "srf", "srw", "x3f",
];

/// Returns true when `path` has a recognized raw extension (case-insensitive).
pub fn is_recognized_raw_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            RAW_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Per-file decode failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The file could not be opened or identified.
    #[error("cannot open file")]
    CannotOpen,
    /// The file opened but its sample data could not be unpacked.
    #[error("cannot unpack file")]
    CannotUnpack,
    /// The file's dimensions differ from the stack's.
    #[error("size mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, got.0, got.1)]
    SizeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
}

/// Sensor geometry reported by a decoder probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawInfo {
    /// Raw width in samples, including any masked border.
    pub width: usize,
    /// Raw height in samples.
    pub height: usize,
    /// Largest value the sensor can produce.
    pub max_value: u16,
}

/// Source of raw sample planes.
///
/// Implementations are shared across ingestion workers, hence `Sync`.
pub trait RawDecoder: Sync {
    /// Reads the raw dimensions and white level of `path`.
    fn probe(&self, path: &Path) -> Result<RawInfo, DecodeError>;

    /// Decodes `path` into `out`, which holds exactly `width * height` samples.
    fn decode_plane(
        &self,
        path: &Path,
        width: usize,
        height: usize,
        out: &mut [u16],
    ) -> Result<(), DecodeError>;

    /// Whether a directory entry should be treated as an input.
    fn is_candidate(&self, path: &Path) -> bool {
        is_recognized_raw_extension(path)
    }
}

impl<D: RawDecoder + ?Sized> RawDecoder for &D {
    fn probe(&self, path: &Path) -> Result<RawInfo, DecodeError> {
        (**self).probe(path)
    }

    fn decode_plane(
        &self,
        path: &Path,
        width: usize,
        height: usize,
        out: &mut [u16],
    ) -> Result<(), DecodeError> {
        (**self).decode_plane(path, width, height, out)
    }

    fn is_candidate(&self, path: &Path) -> bool {
        (**self).is_candidate(path)
    }
}

#[cfg(test)]
mod tests {
    use super::is_recognized_raw_extension;
    use std::path::Path;

    #[test]
    fn raw_extensions_are_case_insensitive() {
        assert!(is_recognized_raw_extension(Path::new("DSC0001.ARW")));
        assert!(is_recognized_raw_extension(Path::new("/tmp/frame.nef")));
        assert!(is_recognized_raw_extension(Path::new("a.b.Cr3")));
    }

    #[test]
    fn non_raw_files_are_rejected() {
        assert!(!is_recognized_raw_extension(Path::new("notes.txt")));
        assert!(!is_recognized_raw_extension(Path::new("preview.jpg")));
        assert!(!is_recognized_raw_extension(Path::new("no_extension")));
    }
}
