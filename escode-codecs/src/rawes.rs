//! Raw pass-through codec engine.
//!
//! Frames pictures into start-code-delimited coded units without compressing
//! them, so the full pipeline (segmentation included) can run without an
//! external codec library. One unit per picture:
//!
//! ```text
//! 00 00 01 | 0x45 | escaped( pts:i64 | flags:u8 | payload_len:u32 | planes )
//! ```
//!
//! Header integers are big-endian. The body is escaped with H.264-style
//! emulation prevention (a 0x03 byte after any `00 00` pair followed by a
//! byte <= 0x03), so payload bytes can never fake a unit boundary.
//!
//! The encoder holds back `max_b_frames` units in an internal delay queue,
//! modeling the reordering latency of a real engine; the decoder emits
//! pictures with 32-byte-aligned strides, so the stride-aware write path is
//! exercised on every decode.

use crate::params::CodecParams;
use crate::traits::{
    CodecInfo, DecoderPoll, EncoderInput, EncoderPoll, SubmitStatus, VideoDecoder, VideoEncoder,
};
use byteorder::{BigEndian, ByteOrder};
use escode_core::segmenter::START_CODE;
use escode_core::{CodedUnit, Error, Picture, PixelFormat, Result, Stage, UnitFlags};
use std::collections::VecDeque;
use tracing::debug;

/// Unit type byte following the start code.
const UNIT_TYPE_FRAME: u8 = 0x45;

/// Unescaped header length: pts + flags + payload length.
const HEADER_LEN: usize = 8 + 1 + 4;

fn codec_info() -> CodecInfo {
    CodecInfo {
        name: "raw",
        long_name: "Raw YUV 4:2:0 pass-through",
        can_encode: true,
        can_decode: true,
    }
}

fn align32(n: usize) -> usize {
    (n + 31) & !31
}

/// Add emulation prevention bytes to a unit body.
fn add_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() + data.len() / 64);
    let mut zeros = 0;

    for &byte in data {
        if zeros == 2 && byte <= 3 {
            result.push(3);
            zeros = 0;
        }

        result.push(byte);

        if byte == 0 {
            zeros += 1;
        } else {
            zeros = 0;
        }
    }

    result
}

/// Remove emulation prevention bytes from a unit body.
fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        if i + 2 < data.len() && data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 3 {
            result.push(0);
            result.push(0);
            i += 3;
        } else {
            result.push(data[i]);
            i += 1;
        }
    }

    result
}

/// Pass-through encoder with a configurable output delay.
pub struct RawEncoder {
    params: CodecParams,
    delay: usize,
    queue: VecDeque<CodedUnit>,
    flushing: bool,
    frames_in: u64,
}

impl RawEncoder {
    /// Create a new raw encoder.
    pub fn new(params: &CodecParams) -> Result<Self> {
        params.validate()?;
        if params.pixel_format != PixelFormat::Yuv420p {
            return Err(Error::config(format!(
                "raw engine supports yuv420p only, got {}",
                params.pixel_format
            )));
        }
        Ok(Self {
            params: params.clone(),
            delay: params.max_b_frames as usize,
            queue: VecDeque::new(),
            flushing: false,
            frames_in: 0,
        })
    }

    fn frame_to_unit(&self, picture: &Picture) -> Result<CodedUnit> {
        if picture.width() != self.params.width || picture.height() != self.params.height {
            return Err(Error::engine(
                Stage::Submit,
                format!(
                    "picture size {}x{} does not match configured {}x{}",
                    picture.width(),
                    picture.height(),
                    self.params.width,
                    self.params.height
                ),
            ));
        }

        let payload_len = self.params.frame_size();
        let mut rbsp = Vec::with_capacity(HEADER_LEN + payload_len);
        rbsp.resize(HEADER_LEN, 0);

        let flags = if self.frames_in % u64::from(self.params.gop_size) == 0 {
            UnitFlags::KEYFRAME
        } else {
            UnitFlags::empty()
        };
        BigEndian::write_i64(&mut rbsp[0..8], picture.pts);
        rbsp[8] = flags.bits() as u8;
        BigEndian::write_u32(&mut rbsp[9..13], payload_len as u32);

        picture
            .store(&mut rbsp)
            .map_err(|_| Error::engine(Stage::Submit, "frame serialization failed"))?;

        let escaped = add_emulation_prevention(&rbsp);
        let mut data = Vec::with_capacity(START_CODE.len() + 1 + escaped.len());
        data.extend_from_slice(&START_CODE);
        data.push(UNIT_TYPE_FRAME);
        data.extend_from_slice(&escaped);

        Ok(CodedUnit::new(data).with_pts(picture.pts).with_flags(flags))
    }
}

impl VideoEncoder for RawEncoder {
    fn info(&self) -> CodecInfo {
        codec_info()
    }

    fn submit(&mut self, input: EncoderInput<'_>) -> Result<SubmitStatus> {
        match input {
            EncoderInput::Frame(picture) => {
                if self.flushing {
                    return Ok(SubmitStatus::Busy);
                }
                let unit = self.frame_to_unit(picture)?;
                debug!(pts = unit.pts, size = unit.size(), "queued coded unit");
                self.queue.push_back(unit);
                self.frames_in += 1;
                Ok(SubmitStatus::Accepted)
            }
            EncoderInput::EndOfStream => {
                self.flushing = true;
                Ok(SubmitStatus::Accepted)
            }
        }
    }

    fn retrieve(&mut self) -> Result<EncoderPoll> {
        if self.queue.len() > self.delay || (self.flushing && !self.queue.is_empty()) {
            // Delay window satisfied (or flushing): release the oldest unit.
            let unit = self.queue.pop_front().map(EncoderPoll::Unit);
            return Ok(unit.unwrap_or(EncoderPoll::NotReady));
        }
        if self.flushing {
            Ok(EncoderPoll::Drained)
        } else {
            Ok(EncoderPoll::NotReady)
        }
    }
}

/// Pass-through decoder producing stride-padded pictures.
pub struct RawDecoder {
    params: CodecParams,
    strides: [usize; 3],
    queue: VecDeque<Picture>,
    frames_out: u64,
}

impl RawDecoder {
    /// Create a new raw decoder.
    pub fn new(params: &CodecParams) -> Result<Self> {
        params.validate()?;
        if params.pixel_format != PixelFormat::Yuv420p {
            return Err(Error::config(format!(
                "raw engine supports yuv420p only, got {}",
                params.pixel_format
            )));
        }
        let w = params.width as usize;
        Ok(Self {
            params: params.clone(),
            strides: [align32(w), align32(w / 2), align32(w / 2)],
            queue: VecDeque::new(),
            frames_out: 0,
        })
    }
}

impl VideoDecoder for RawDecoder {
    fn info(&self) -> CodecInfo {
        codec_info()
    }

    fn submit(&mut self, unit: &CodedUnit) -> Result<SubmitStatus> {
        let data = unit.data();
        if data.len() < START_CODE.len() + 1
            || data[..START_CODE.len()] != START_CODE
            || data[START_CODE.len()] != UNIT_TYPE_FRAME
        {
            return Err(Error::malformed("coded unit is not start-code framed"));
        }

        let rbsp = remove_emulation_prevention(&data[START_CODE.len() + 1..]);
        if rbsp.len() < HEADER_LEN {
            return Err(Error::malformed("coded unit shorter than its header"));
        }

        let pts = BigEndian::read_i64(&rbsp[0..8]);
        let payload_len = BigEndian::read_u32(&rbsp[9..13]) as usize;
        let payload = &rbsp[HEADER_LEN..];

        let expected = self.params.frame_size();
        if payload_len != expected || payload.len() != payload_len {
            return Err(Error::malformed(format!(
                "unit payload of {} bytes, expected {expected}",
                payload.len()
            )));
        }

        let mut picture =
            Picture::with_strides(self.params.width, self.params.height, self.strides)?;
        picture.load(payload)?;
        picture.pts = pts;

        debug!(pts, "decoded picture");
        self.queue.push_back(picture);
        self.frames_out += 1;
        Ok(SubmitStatus::Accepted)
    }

    fn retrieve(&mut self) -> Result<DecoderPoll> {
        match self.queue.pop_front() {
            Some(picture) => Ok(DecoderPoll::Picture(picture)),
            None => Ok(DecoderPoll::NotReady),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params(width: u32, height: u32) -> CodecParams {
        CodecParams::default().with_dimensions(width, height)
    }

    fn test_picture(width: u32, height: u32, pts: i64) -> Picture {
        let mut picture = Picture::allocate(width, height).unwrap();
        let size = PixelFormat::Yuv420p.frame_size(width, height);
        let raw: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        picture.load(&raw).unwrap();
        picture.pts = pts;
        picture
    }

    #[test]
    fn test_emulation_prevention_roundtrip() {
        let data = [0x00, 0x00, 0x01];
        let escaped = add_emulation_prevention(&data);
        assert_eq!(escaped, vec![0x00, 0x00, 0x03, 0x01]);
        assert_eq!(remove_emulation_prevention(&escaped), data.to_vec());

        // Zero runs expand but survive the round trip.
        let zeros = vec![0u8; 64];
        let escaped = add_emulation_prevention(&zeros);
        assert!(escaped.len() > zeros.len());
        assert_eq!(remove_emulation_prevention(&escaped), zeros);
    }

    #[test]
    fn test_escaped_body_never_contains_start_code() {
        let params = test_params(64, 64);
        let mut encoder = RawEncoder::new(&params).unwrap();
        let mut picture = Picture::allocate(64, 64).unwrap();
        picture.load(&vec![0u8; params.frame_size()]).unwrap();

        encoder.submit(EncoderInput::Frame(&picture)).unwrap();
        let unit = match encoder.retrieve().unwrap() {
            EncoderPoll::Unit(unit) => unit,
            other => panic!("expected unit, got {other:?}"),
        };

        let body = &unit.data()[START_CODE.len()..];
        assert!(!body
            .windows(3)
            .any(|w| w[0] == 0x00 && w[1] == 0x00 && w[2] == 0x01));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let params = test_params(16, 16);
        let mut encoder = RawEncoder::new(&params).unwrap();
        let mut decoder = RawDecoder::new(&params).unwrap();

        let picture = test_picture(16, 16, 5);
        let mut source = Vec::new();
        picture.store(&mut source).unwrap();

        encoder.submit(EncoderInput::Frame(&picture)).unwrap();
        let unit = match encoder.retrieve().unwrap() {
            EncoderPoll::Unit(unit) => unit,
            other => panic!("expected unit, got {other:?}"),
        };
        assert_eq!(&unit.data()[..3], &START_CODE[..]);

        decoder.submit(&unit).unwrap();
        let decoded = match decoder.retrieve().unwrap() {
            DecoderPoll::Picture(picture) => picture,
            other => panic!("expected picture, got {other:?}"),
        };

        assert_eq!(decoded.pts, 5);
        // Decoder strides are padded for alignment; stored rows match the
        // original samples exactly.
        assert_eq!(decoded.stride(0), 32);
        assert!(!decoded.is_tight());
        let mut sink = Vec::new();
        decoded.store(&mut sink).unwrap();
        assert_eq!(sink, source);
    }

    #[test]
    fn test_delay_queue_and_flush() {
        let params = test_params(16, 16).with_max_b_frames(2);
        let mut encoder = RawEncoder::new(&params).unwrap();

        for pts in 0..2 {
            encoder
                .submit(EncoderInput::Frame(&test_picture(16, 16, pts)))
                .unwrap();
            assert!(matches!(
                encoder.retrieve().unwrap(),
                EncoderPoll::NotReady
            ));
        }

        // Third frame exceeds the delay window and releases the first.
        encoder
            .submit(EncoderInput::Frame(&test_picture(16, 16, 2)))
            .unwrap();
        match encoder.retrieve().unwrap() {
            EncoderPoll::Unit(unit) => assert_eq!(unit.pts, 0),
            other => panic!("expected unit, got {other:?}"),
        }
        assert!(matches!(encoder.retrieve().unwrap(), EncoderPoll::NotReady));

        encoder.submit(EncoderInput::EndOfStream).unwrap();
        let mut flushed = Vec::new();
        loop {
            match encoder.retrieve().unwrap() {
                EncoderPoll::Unit(unit) => flushed.push(unit.pts),
                EncoderPoll::NotReady => continue,
                EncoderPoll::Drained => break,
            }
        }
        assert_eq!(flushed, vec![1, 2]);

        // Nothing is ever emitted after Drained.
        assert!(matches!(encoder.retrieve().unwrap(), EncoderPoll::Drained));
    }

    #[test]
    fn test_submit_after_end_of_stream_is_busy() {
        let params = test_params(16, 16);
        let mut encoder = RawEncoder::new(&params).unwrap();
        encoder.submit(EncoderInput::EndOfStream).unwrap();
        let status = encoder
            .submit(EncoderInput::Frame(&test_picture(16, 16, 0)))
            .unwrap();
        assert_eq!(status, SubmitStatus::Busy);
    }

    #[test]
    fn test_keyframe_flag_follows_gop() {
        let params = test_params(16, 16).with_gop_size(2);
        let mut encoder = RawEncoder::new(&params).unwrap();

        let mut keyframes = Vec::new();
        for pts in 0..4 {
            encoder
                .submit(EncoderInput::Frame(&test_picture(16, 16, pts)))
                .unwrap();
            match encoder.retrieve().unwrap() {
                EncoderPoll::Unit(unit) => keyframes.push(unit.is_keyframe()),
                other => panic!("expected unit, got {other:?}"),
            }
        }
        assert_eq!(keyframes, vec![true, false, true, false]);
    }

    #[test]
    fn test_decoder_rejects_mismatched_payload() {
        let encode_params = test_params(16, 16);
        let mut encoder = RawEncoder::new(&encode_params).unwrap();
        encoder
            .submit(EncoderInput::Frame(&test_picture(16, 16, 0)))
            .unwrap();
        let unit = match encoder.retrieve().unwrap() {
            EncoderPoll::Unit(unit) => unit,
            other => panic!("expected unit, got {other:?}"),
        };

        let mut decoder = RawDecoder::new(&test_params(32, 32)).unwrap();
        assert!(matches!(
            decoder.submit(&unit),
            Err(Error::MalformedStream(_))
        ));
    }

    #[test]
    fn test_decoder_rejects_garbage_unit() {
        let mut decoder = RawDecoder::new(&test_params(16, 16)).unwrap();
        let unit = CodedUnit::new(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(matches!(
            decoder.submit(&unit),
            Err(Error::MalformedStream(_))
        ));
    }
}
