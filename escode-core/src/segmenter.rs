//! Elementary-stream unit segmentation.
//!
//! Carves a raw, unframed byte stream into discrete coded units when the
//! container supplies no explicit framing. Units are delimited by the
//! three-byte start code `00 00 01`; a unit spans one start code up to (but
//! not including) the next, so the final unit of a stream is only recognized
//! at [`UnitSegmenter::finalize`].

use crate::error::{Error, Result};
use crate::unit::CodedUnit;

/// Start code marking the beginning of a coded unit.
pub const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Upper bound on the residual carried between chunks.
///
/// No access unit in this elementary format approaches this size; exceeding
/// it without finding a boundary means the scan cannot make forward progress
/// and the stream is not in the expected format.
pub const MAX_UNIT_BYTES: usize = 4 << 20;

/// Stateful scanner converting fixed-size chunks into coded units.
///
/// Bytes are never dropped: every input byte is either consumed into an
/// emitted unit or retained in the residual until stream end.
#[derive(Debug, Default)]
pub struct UnitSegmenter {
    /// Unconsumed tail of the stream, always beginning with a start code
    /// once the stream head has been validated.
    residual: Vec<u8>,
    /// Whether the leading start code has been seen.
    started: bool,
    /// Offset from which the next boundary search resumes.
    scan_pos: usize,
}

impl UnitSegmenter {
    /// Create a new segmenter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes currently held in the residual.
    pub fn residual_len(&self) -> usize {
        self.residual.len()
    }

    /// Feed one chunk of stream bytes, returning all units completed by it.
    ///
    /// Emitted units preserve original byte order and each carries its start
    /// code. Fails with [`Error::MalformedStream`] when the stream does not
    /// begin with a start code or when [`MAX_UNIT_BYTES`] accumulate without
    /// a boundary.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<CodedUnit>> {
        let mut units = Vec::new();
        if chunk.is_empty() {
            return Ok(units);
        }
        self.residual.extend_from_slice(chunk);

        if !self.started {
            if self.residual.len() < START_CODE.len() {
                return Ok(units);
            }
            if self.residual[..START_CODE.len()] != START_CODE {
                return Err(Error::malformed(
                    "stream does not begin with a start code",
                ));
            }
            self.started = true;
            self.scan_pos = START_CODE.len();
        }

        while let Some(pos) = find_start_code(&self.residual, self.scan_pos) {
            let data: Vec<u8> = self.residual.drain(..pos).collect();
            units.push(CodedUnit::new(data));
            self.scan_pos = START_CODE.len();
        }

        // The last two residual bytes may be the head of a split start code;
        // everything before them has been scanned.
        self.scan_pos = self
            .residual
            .len()
            .saturating_sub(2)
            .max(START_CODE.len());

        if self.residual.len() > MAX_UNIT_BYTES {
            return Err(Error::malformed(format!(
                "no unit boundary within {MAX_UNIT_BYTES} bytes"
            )));
        }
        Ok(units)
    }

    /// Flush the terminal unit at end of input.
    ///
    /// The residual is cleared only here. Returns `None` when no bytes are
    /// pending, the final unit when the residual begins with a start code,
    /// and [`Error::MalformedStream`] when trailing bytes never formed one.
    pub fn finalize(&mut self) -> Result<Option<CodedUnit>> {
        if self.residual.is_empty() {
            return Ok(None);
        }
        if !self.started {
            return Err(Error::malformed("truncated stream: no complete unit"));
        }
        let data = std::mem::take(&mut self.residual);
        self.started = false;
        self.scan_pos = 0;
        Ok(Some(CodedUnit::new(data)))
    }
}

/// Find the next start code at or after `from`.
fn find_start_code(data: &[u8], from: usize) -> Option<usize> {
    if data.len() < START_CODE.len() {
        return None;
    }
    (from..data.len() - 2)
        .find(|&i| data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01)
}
