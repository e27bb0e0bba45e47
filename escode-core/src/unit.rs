//! Coded access units.
//!
//! A [`CodedUnit`] is an opaque, variable-length byte span holding one
//! decodable/encodable access unit of the compressed bitstream. Units own
//! their bytes, so engine output can be written to a sink after the engine's
//! internal buffers have been reused.

use bitflags::bitflags;
use std::fmt;

/// Sentinel timestamp for units whose presentation time is unknown.
pub const NO_PTS: i64 = i64::MIN;

bitflags! {
    /// Flags for coded unit properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UnitFlags: u32 {
        /// This unit contains a keyframe.
        const KEYFRAME = 0x0001;
        /// Unit data is corrupted.
        const CORRUPT = 0x0002;
    }
}

/// An encoded access unit.
#[derive(Clone)]
pub struct CodedUnit {
    data: Vec<u8>,
    /// Presentation timestamp in frame units, or [`NO_PTS`].
    pub pts: i64,
    /// Unit flags.
    pub flags: UnitFlags,
}

impl CodedUnit {
    /// Create a new unit owning the given bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pts: NO_PTS,
            flags: UnitFlags::empty(),
        }
    }

    /// Set the presentation timestamp.
    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = pts;
        self
    }

    /// Set the unit flags.
    pub fn with_flags(mut self, flags: UnitFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Get the unit data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the size of the unit data.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if this unit is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if this is a keyframe unit.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(UnitFlags::KEYFRAME)
    }
}

impl fmt::Debug for CodedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodedUnit")
            .field("size", &self.size())
            .field("pts", &self.pts)
            .field("flags", &self.flags)
            .finish()
    }
}
