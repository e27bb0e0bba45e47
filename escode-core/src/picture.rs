//! Planar picture buffers.
//!
//! A [`Picture`] holds one decoded video picture as three contiguous planes
//! (luma plus two 2x2-subsampled chroma planes) in a single byte buffer.
//! Session-owned pictures are tightly packed; pictures produced by a codec
//! engine may carry per-plane strides wider than the logical row width, and
//! all row access goes through the reported stride.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

/// Pixel format for video pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (1 Cr & Cb sample per 2x2 Y samples).
    #[default]
    Yuv420p,
}

impl PixelFormat {
    /// Get the number of planes for this pixel format.
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Yuv420p => 3,
        }
    }

    /// Get the bits per pixel.
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Yuv420p => 12,
        }
    }

    /// Get chroma subsampling factors (horizontal, vertical).
    pub fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p => (2, 2),
        }
    }

    /// Total byte size of one tightly packed picture.
    pub fn frame_size(&self, width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * (self.bits_per_pixel() as usize) / 8
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yuv420p => write!(f, "yuv420p"),
        }
    }
}

/// One planar YUV 4:2:0 picture.
///
/// The buffer holds the three planes back to back; byte offsets are derived
/// once from width, height, and strides, never recomputed per frame.
#[derive(Clone)]
pub struct Picture {
    width: u32,
    height: u32,
    strides: [usize; 3],
    data: Vec<u8>,
    /// Presentation timestamp in frame units.
    pub pts: i64,
}

impl Picture {
    /// Allocate a tightly packed picture (stride equals row width).
    ///
    /// Fails with [`Error::Allocation`] if the buffer cannot be obtained and
    /// [`Error::Config`] if the dimensions are zero or odd.
    pub fn allocate(width: u32, height: u32) -> Result<Self> {
        validate_dimensions(width, height)?;
        let w = width as usize;
        let strides = [w, w / 2, w / 2];
        Self::with_strides(width, height, strides)
    }

    /// Allocate a picture with explicit per-plane strides.
    ///
    /// Strides may exceed the logical row width for alignment, but never be
    /// smaller.
    pub fn with_strides(width: u32, height: u32, strides: [usize; 3]) -> Result<Self> {
        validate_dimensions(width, height)?;
        let w = width as usize;
        let row_bytes = [w, w / 2, w / 2];
        for plane in 0..3 {
            if strides[plane] < row_bytes[plane] {
                return Err(Error::config(format!(
                    "plane {} stride {} smaller than row width {}",
                    plane, strides[plane], row_bytes[plane]
                )));
            }
        }
        let h = height as usize;
        let size = strides[0] * h + strides[1] * (h / 2) + strides[2] * (h / 2);

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| Error::allocation(format!("picture buffer of {size} bytes")))?;
        data.resize(size, 0);

        Ok(Self {
            width,
            height,
            strides,
            data,
            pts: 0,
        })
    }

    /// Byte offsets of the Y, U, and V planes in a tightly packed picture.
    ///
    /// Pure function of the dimensions: always `(0, W*H, W*H + W*H/4)`.
    pub fn plane_offsets(width: u32, height: u32) -> (usize, usize, usize) {
        let luma = (width as usize) * (height as usize);
        (0, luma, luma + luma / 4)
    }

    /// Picture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Picture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Stride (bytes per row) of a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.strides.get(plane).copied().unwrap_or(0)
    }

    /// Whether every plane's stride equals its logical row width.
    pub fn is_tight(&self) -> bool {
        let w = self.width as usize;
        self.strides == [w, w / 2, w / 2]
    }

    /// Total buffer size in bytes.
    pub fn buffer_len(&self) -> usize {
        self.data.len()
    }

    /// Get a plane's data, including any stride padding.
    pub fn plane(&self, plane: usize) -> Option<&[u8]> {
        if plane >= 3 {
            return None;
        }
        let start = self.plane_start(plane);
        let len = self.strides[plane] * self.plane_rows(plane);
        Some(&self.data[start..start + len])
    }

    /// Get a mutable reference to a plane's data.
    pub fn plane_mut(&mut self, plane: usize) -> Option<&mut [u8]> {
        if plane >= 3 {
            return None;
        }
        let start = self.plane_start(plane);
        let len = self.strides[plane] * self.plane_rows(plane);
        Some(&mut self.data[start..start + len])
    }

    /// Load raw plane-concatenated bytes into this picture.
    ///
    /// `raw` must hold exactly one tightly packed picture (`W*H*3/2` bytes);
    /// any other length fails with [`Error::ShortRead`], which the caller
    /// treats as end-of-stream when the source is exhausted and as corruption
    /// otherwise. Rows are placed at this picture's strides.
    pub fn load(&mut self, raw: &[u8]) -> Result<()> {
        let expected = PixelFormat::Yuv420p.frame_size(self.width, self.height);
        if raw.len() != expected {
            return Err(Error::ShortRead {
                expected,
                actual: raw.len(),
            });
        }

        let mut src = 0;
        for plane in 0..3 {
            let rows = self.plane_rows(plane);
            let row_bytes = self.plane_row_bytes(plane);
            let stride = self.strides[plane];
            let start = self.plane_start(plane);
            for row in 0..rows {
                let dst = start + row * stride;
                self.data[dst..dst + row_bytes].copy_from_slice(&raw[src..src + row_bytes]);
                src += row_bytes;
            }
        }
        Ok(())
    }

    /// Write the picture's logical rows to a sink in plane order.
    ///
    /// Row copies honor the reported stride of each plane, which may exceed
    /// the row width; padding bytes are never written. The output is always
    /// exactly `W*H*3/2` bytes.
    pub fn store<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for plane in 0..3 {
            let rows = self.plane_rows(plane);
            let row_bytes = self.plane_row_bytes(plane);
            let stride = self.strides[plane];
            let start = self.plane_start(plane);
            for row in 0..rows {
                let off = start + row * stride;
                sink.write_all(&self.data[off..off + row_bytes])?;
            }
        }
        Ok(())
    }

    fn plane_rows(&self, plane: usize) -> usize {
        let h = self.height as usize;
        if plane == 0 {
            h
        } else {
            h / 2
        }
    }

    fn plane_row_bytes(&self, plane: usize) -> usize {
        let w = self.width as usize;
        if plane == 0 {
            w
        } else {
            w / 2
        }
    }

    fn plane_start(&self, plane: usize) -> usize {
        (0..plane).map(|p| self.strides[p] * self.plane_rows(p)).sum()
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("strides", &self.strides)
            .field("pts", &self.pts)
            .finish()
    }
}

fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(Error::config(format!(
            "picture dimensions must be even and non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}
