//! Decoder for fixed-layout containers with verbatim little-endian samples.

use std::fs;
use std::path::Path;

use crate::decode::{DecodeError, RawDecoder, RawInfo};

/// Reads `width * height` little-endian `u16` samples at a fixed byte offset.
///
/// This covers headerless sensor dumps and uncompressed containers whose
/// layout is known up front. Any bytes before `offset` or after the sample
/// region are ignored, which is also what makes such files valid patch
/// references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDumpDecoder {
    width: usize,
    height: usize,
    offset: usize,
    max_value: u16,
    extensions: Option<Vec<String>>,
}

impl RawDumpDecoder {
    /// Creates a decoder for 16-bit samples starting at byte 0.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            max_value: u16::MAX,
            extensions: None,
        }
    }

    /// Sets the byte offset of the first sample.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the sensor bit depth; `max_value` becomes `2^bits - 1`.
    pub fn with_bit_depth(mut self, bits: u32) -> Self {
        self.max_value = match bits {
            0 => 0,
            1..=15 => ((1u32 << bits) - 1) as u16,
            _ => u16::MAX,
        };
        self
    }

    /// Restricts directory candidates to these extensions (case-insensitive).
    ///
    /// Without a restriction every regular file is a candidate.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|ext| ext.into().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    /// Byte offset of the first sample.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn sample_bytes(&self) -> usize {
        self.width * self.height * 2
    }
}

impl RawDecoder for RawDumpDecoder {
    fn probe(&self, path: &Path) -> Result<RawInfo, DecodeError> {
        let meta = fs::metadata(path).map_err(|_| DecodeError::CannotOpen)?;
        if !meta.is_file() {
            return Err(DecodeError::CannotOpen);
        }
        Ok(RawInfo {
            width: self.width,
            height: self.height,
            max_value: self.max_value,
        })
    }

    fn decode_plane(
        &self,
        path: &Path,
        width: usize,
        height: usize,
        out: &mut [u16],
    ) -> Result<(), DecodeError> {
        if (width, height) != (self.width, self.height) {
            return Err(DecodeError::SizeMismatch {
                expected: (width, height),
                got: (self.width, self.height),
            });
        }
        let bytes = fs::read(path).map_err(|_| DecodeError::CannotOpen)?;
        let end = self
            .offset
            .checked_add(self.sample_bytes())
            .ok_or(DecodeError::CannotUnpack)?;
        let region = bytes.get(self.offset..end).ok_or(DecodeError::CannotUnpack)?;
        if out.len() != width * height {
            return Err(DecodeError::CannotUnpack);
        }
        for (dst, pair) in out.iter_mut().zip(region.chunks_exact(2)) {
            *dst = u16::from_le_bytes([pair[0], pair[1]]);
        }
        Ok(())
    }

    fn is_candidate(&self, path: &Path) -> bool {
        match &self.extensions {
            None => true,
            Some(allowed) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
                .unwrap_or(false),
        }
    }
}
