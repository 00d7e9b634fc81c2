//! Writing results back into a copy of a source raw container.
//!
//! The container format is never parsed. The reference file's own decoded
//! plane is serialized as little-endian 16-bit samples and searched for
//! verbatim in the file's bytes; the first match is overwritten with the
//! result plane and everything else (headers, metadata, thumbnails, trailers)
//! is kept byte for byte. Files whose samples are compressed or rearranged
//! produce no match and are rejected with [`RawStackError::MayBeCompressed`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{RawStackError, Result};

/// Where a patch landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchReport {
    /// Byte offset of the sample region in the container.
    pub offset: usize,
    /// Length of the sample region in bytes.
    pub region_len: usize,
    /// Size of the written container in bytes.
    pub file_len: usize,
}

/// Serializes samples as little-endian 16-bit values, low byte first.
pub fn encode_le16(samples: &[u16]) -> Vec<u8> {
    let mut out = vec![0u8; samples.len() * 2];
    write_le16(samples, &mut out);
    out
}

/// Writes `samples` little-endian into `dst`, which holds `2 * samples.len()` bytes.
pub fn write_le16(samples: &[u16], dst: &mut [u8]) {
    for (pair, sample) in dst.chunks_exact_mut(2).zip(samples) {
        pair.copy_from_slice(&sample.to_le_bytes());
    }
}

/// Offset of the first exact occurrence of `needle` in `haystack`.
pub fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let first = needle[0];
    let last_start = haystack.len() - needle.len();
    let mut start = 0;
    while start <= last_start {
        let hit = haystack[start..=last_start].iter().position(|&b| b == first)?;
        let candidate = start + hit;
        if haystack[candidate..].starts_with(needle) {
            return Some(candidate);
        }
        start = candidate + 1;
    }
    None
}

/// Overwrites the little-endian image of `original` inside `container` with
/// `replacement`, returning the byte offset, or `None` if `original` does not
/// appear verbatim.
pub fn patch_bytes(container: &mut [u8], original: &[u16], replacement: &[u16]) -> Option<usize> {
    debug_assert_eq!(original.len(), replacement.len());
    let key = encode_le16(original);
    let offset = find_subslice(container, &key)?;
    write_le16(replacement, &mut container[offset..offset + key.len()]);
    Some(offset)
}

/// Writes a copy of `reference` to `destination` with its sample region
/// replaced by `output`.
///
/// `original` must be the reference file's own decoded plane; both planes
/// hold `width * height` samples. An existing `destination` is replaced.
pub fn patch_and_write(
    reference: &Path,
    destination: &Path,
    output: &[u16],
    original: &[u16],
    width: usize,
    height: usize,
) -> Result<PatchReport> {
    let expected = width
        .checked_mul(height)
        .filter(|&n| n > 0)
        .ok_or(RawStackError::InvalidDimensions {
            width,
            height,
            n_images: 1,
        })?;
    for plane in [output, original] {
        if plane.len() != expected {
            return Err(RawStackError::PlaneLength {
                expected,
                got: plane.len(),
            });
        }
    }

    let _span = trace_span!("patch", reference = %reference.display()).entered();
    let mut bytes = fs::read(reference).map_err(|source| RawStackError::CannotOpenReference {
        path: reference.to_path_buf(),
        source,
    })?;

    let Some(offset) = patch_bytes(&mut bytes, original, output) else {
        trace_warn!("sample_region_missing", bytes = bytes.len());
        return Err(RawStackError::MayBeCompressed {
            path: reference.to_path_buf(),
        });
    };
    trace_event!("sample_region_found", offset = offset, bytes = bytes.len());

    fs::write(destination, &bytes).map_err(|source| RawStackError::WriteFailure {
        path: destination.to_path_buf(),
        source,
    })?;

    Ok(PatchReport {
        offset,
        region_len: expected * 2,
        file_len: bytes.len(),
    })
}

/// Default destination: `output.<ext>` in the working directory, with the
/// extension of `reference`.
pub fn default_output_path(reference: &Path) -> PathBuf {
    let mut path = PathBuf::from("output");
    if let Some(ext) = reference.extension() {
        path.set_extension(ext);
    }
    path
}
