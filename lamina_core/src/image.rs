// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoded pixel buffers handed over by an external image decoder.

use crate::error::{Error, Result};
use crate::geometry::IntSize;

/// Layout of one pixel in an [`ImageBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One 8-bit alpha (coverage) channel.
    Alpha,
    /// Three 8-bit channels.
    Rgb,
    /// Four 8-bit channels.
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[inline]
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// A tightly packed, top-row-first pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    size: IntSize,
    format: PixelFormat,
    bytes: Vec<u8>,
}

impl core::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageBuffer {
    /// Wraps decoded pixels after checking that the byte count matches the
    /// dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageSize`] if `bytes.len()` differs from
    /// `width × height × bytes_per_pixel`, or if that product overflows
    /// `usize` (reported as `expected: usize::MAX`).
    pub fn new(size: IntSize, format: PixelFormat, bytes: Vec<u8>) -> Result<Self> {
        let expected = size
            .area()
            .and_then(|area| area.checked_mul(format.bytes_per_pixel()))
            .unwrap_or(usize::MAX);
        if bytes.len() != expected {
            return Err(Error::ImageSize {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            size,
            format,
            bytes,
        })
    }

    /// Creates an image filled with one RGBA color.
    #[cfg(test)]
    pub(crate) fn filled(size: IntSize, rgba: [u8; 4]) -> Self {
        let bytes = rgba.repeat(size.area().unwrap_or_default());
        Self {
            size,
            format: PixelFormat::Rgba,
            bytes,
        }
    }

    /// Image dimensions.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> IntSize {
        self.size
    }

    /// Pixel layout.
    #[inline]
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel bytes.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
