//! LibRaw-backed decoder (feature `libraw`).

use std::fs;
use std::path::Path;
use std::slice;

use libraw_sys as sys;

use crate::decode::{DecodeError, RawDecoder, RawInfo};

/// Owns a `libraw_data_t` and closes it on drop.
struct LibrawGuard(*mut sys::libraw_data_t);

impl LibrawGuard {
    /// Initializes LibRaw and opens `buf`; `buf` must outlive the guard.
    fn open(buf: &[u8]) -> Result<Self, DecodeError> {
        // SAFETY: libraw_init returns a valid pointer or null on failure.
        let inner = unsafe { sys::libraw_init(0) };
        if inner.is_null() {
            return Err(DecodeError::CannotOpen);
        }
        let guard = LibrawGuard(inner);
        // SAFETY: inner is valid and buf stays alive for the guard's lifetime.
        let ret = unsafe { sys::libraw_open_buffer(inner, buf.as_ptr() as *const _, buf.len()) };
        if ret != 0 {
            return Err(DecodeError::CannotOpen);
        }
        Ok(guard)
    }

    fn info(&self) -> RawInfo {
        // SAFETY: the handle is open, so sizes and color are initialized.
        let (width, height, maximum) = unsafe {
            (
                (*self.0).sizes.raw_width as usize,
                (*self.0).sizes.raw_height as usize,
                (*self.0).color.maximum,
            )
        };
        let max_value = match maximum {
            0 => u16::MAX,
            m => m.min(u16::MAX as _) as u16,
        };
        RawInfo {
            width,
            height,
            max_value,
        }
    }
}

// SAFETY: the guard owns its handle exclusively; separate LibRaw instances are
// independent.
unsafe impl Send for LibrawGuard {}

impl Drop for LibrawGuard {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: we own the pointer returned by libraw_init.
            unsafe { sys::libraw_close(self.0) };
        }
    }
}

/// Decodes vendor raw files through LibRaw's unpacked `raw_image` plane.
///
/// Only Bayer/monochrome files expose a single-sample `raw_image`; files
/// LibRaw unpacks into a multi-channel layout report `CannotUnpack`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LibRawDecoder;

impl LibRawDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl RawDecoder for LibRawDecoder {
    fn probe(&self, path: &Path) -> Result<RawInfo, DecodeError> {
        let buf = fs::read(path).map_err(|_| DecodeError::CannotOpen)?;
        let guard = LibrawGuard::open(&buf)?;
        let info = guard.info();
        drop(guard);
        Ok(info)
    }

    fn decode_plane(
        &self,
        path: &Path,
        width: usize,
        height: usize,
        out: &mut [u16],
    ) -> Result<(), DecodeError> {
        let buf = fs::read(path).map_err(|_| DecodeError::CannotOpen)?;
        let guard = LibrawGuard::open(&buf)?;

        // SAFETY: the handle is open.
        let ret = unsafe { sys::libraw_unpack(guard.0) };
        if ret != 0 {
            return Err(DecodeError::CannotUnpack);
        }

        let info = guard.info();
        if (info.width, info.height) != (width, height) {
            return Err(DecodeError::SizeMismatch {
                expected: (width, height),
                got: (info.width, info.height),
            });
        }
        if out.len() != width * height {
            return Err(DecodeError::CannotUnpack);
        }

        // SAFETY: unpack succeeded, so rawdata and sizes are populated.
        let (raw_image, pitch_bytes) =
            unsafe { ((*guard.0).rawdata.raw_image, (*guard.0).sizes.raw_pitch as usize) };
        if raw_image.is_null() {
            return Err(DecodeError::CannotUnpack);
        }
        // Rows may be padded past raw_width.
        let pitch = (pitch_bytes / 2).max(width);
        // SAFETY: raw_image holds raw_height rows of `pitch` samples.
        let samples = unsafe { slice::from_raw_parts(raw_image, pitch * height) };
        for (dst, src) in out.chunks_exact_mut(width).zip(samples.chunks(pitch)) {
            dst.copy_from_slice(&src[..width]);
        }
        drop(guard);
        drop(buf);
        Ok(())
    }
}
