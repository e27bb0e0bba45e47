//! Codec engine configuration.

use escode_core::{Error, PixelFormat, Rational, Result};
use serde::{Deserialize, Serialize};

/// Parameters fixed at engine construction.
///
/// There is no runtime renegotiation: a session's resolution, rate, and
/// tuning are decided before the first byte of I/O. Defaults match the
/// classic test harness configuration (640x480 yuv420p at 30 fps, 468 kbps,
/// GOP 250, no B-frames).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecParams {
    /// Pixel format of raw pictures.
    pub pixel_format: PixelFormat,
    /// Picture width in pixels (even).
    pub width: u32,
    /// Picture height in pixels (even).
    pub height: u32,
    /// Frame rate.
    pub frame_rate: Rational,
    /// Target bitrate in bits per second.
    pub bit_rate: u64,
    /// Group-of-pictures size (keyframe interval).
    pub gop_size: u32,
    /// Maximum consecutive non-reference frames. Also the output delay of
    /// engines that buffer for reordering.
    pub max_b_frames: u32,
    /// Codec-specific tuning key/value pairs (e.g. `preset=slow`,
    /// `tune=zerolatency`). Interpretation is up to the engine.
    pub tuning: Vec<(String, String)>,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Yuv420p,
            width: 640,
            height: 480,
            frame_rate: Rational::new(30, 1),
            bit_rate: 468_000,
            gop_size: 250,
            max_b_frames: 0,
            tuning: Vec::new(),
        }
    }
}

impl CodecParams {
    /// Set picture dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the frame rate.
    pub fn with_frame_rate(mut self, frame_rate: Rational) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the target bitrate.
    pub fn with_bit_rate(mut self, bit_rate: u64) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    /// Set the GOP size.
    pub fn with_gop_size(mut self, gop_size: u32) -> Self {
        self.gop_size = gop_size;
        self
    }

    /// Set the maximum number of consecutive B-frames.
    pub fn with_max_b_frames(mut self, max_b_frames: u32) -> Self {
        self.max_b_frames = max_b_frames;
        self
    }

    /// Add one tuning key/value pair.
    pub fn with_tuning(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tuning.push((key.into(), value.into()));
        self
    }

    /// Byte size of one tightly packed picture at these parameters.
    pub fn frame_size(&self) -> usize {
        self.pixel_format.frame_size(self.width, self.height)
    }

    /// Validate the parameter set.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(Error::config(format!(
                "dimensions must be even and non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.frame_rate.is_positive() {
            return Err(Error::config(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.bit_rate == 0 {
            return Err(Error::config("bit rate must be non-zero"));
        }
        if self.gop_size == 0 {
            return Err(Error::config("GOP size must be at least 1"));
        }
        Ok(())
    }
}
