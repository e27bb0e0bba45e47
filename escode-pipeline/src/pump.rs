//! Pump state machines over the engine submit/retrieve protocol.
//!
//! A pump absorbs the engine's internal reordering and buffering without
//! dropping or duplicating units: submit one input, then drain `retrieve`
//! until the engine reports `NotReady`. `Drained` is only a valid answer
//! while flushing; seeing it mid-stream means the engine state machine has
//! been violated and the session must abort.

use escode_codecs::{DecoderPoll, EncoderInput, EncoderPoll, SubmitStatus, VideoDecoder, VideoEncoder};
use escode_core::{CodedUnit, Error, Picture, Result, Stage};
use std::io::Write;
use tracing::debug;

/// Drives a codec engine's input-frame to output-unit protocol.
pub struct EncodePump {
    encoder: Box<dyn VideoEncoder>,
    next_pts: i64,
    frames_in: u64,
    units_out: u64,
}

impl EncodePump {
    /// Create a pump around an encoder engine.
    pub fn new(encoder: Box<dyn VideoEncoder>) -> Self {
        Self {
            encoder,
            next_pts: 0,
            frames_in: 0,
            units_out: 0,
        }
    }

    /// Number of pictures submitted so far.
    pub fn frames_submitted(&self) -> u64 {
        self.frames_in
    }

    /// Number of coded units written so far.
    pub fn units_written(&self) -> u64 {
        self.units_out
    }

    /// Submit one picture and drain all currently available output.
    ///
    /// The picture is stamped with the next monotonic presentation index.
    /// Unit bytes are written to the sink before the next submit, so the
    /// engine may alias the caller's buffer until then.
    pub fn pump<W: Write>(&mut self, picture: &mut Picture, sink: &mut W) -> Result<()> {
        picture.pts = self.next_pts;
        match self.encoder.submit(EncoderInput::Frame(picture))? {
            SubmitStatus::Accepted => {}
            SubmitStatus::Busy => {
                return Err(Error::engine(
                    Stage::Submit,
                    "encoder refused input without a drain in between",
                ));
            }
        }
        self.next_pts += 1;
        self.frames_in += 1;
        self.drain(sink, false)
    }

    /// Signal end of stream and drain every buffered unit.
    ///
    /// Loops until the engine reports `Drained`, not merely `NotReady`, so
    /// no buffered unit is lost at termination.
    pub fn flush<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        match self.encoder.submit(EncoderInput::EndOfStream)? {
            SubmitStatus::Accepted => {}
            SubmitStatus::Busy => {
                return Err(Error::engine(
                    Stage::Submit,
                    "encoder refused end-of-stream marker",
                ));
            }
        }
        self.drain(sink, true)
    }

    fn drain<W: Write>(&mut self, sink: &mut W, flushing: bool) -> Result<()> {
        loop {
            match self.encoder.retrieve()? {
                EncoderPoll::Unit(unit) => {
                    sink.write_all(unit.data())
                        .map_err(|e| Error::io(Stage::Write, e))?;
                    self.units_out += 1;
                    debug!(pts = unit.pts, size = unit.size(), "wrote coded unit");
                }
                EncoderPoll::NotReady => {
                    if !flushing {
                        return Ok(());
                    }
                }
                EncoderPoll::Drained => {
                    if flushing {
                        return Ok(());
                    }
                    return Err(Error::engine(
                        Stage::Retrieve,
                        "encoder drained mid-stream",
                    ));
                }
            }
        }
    }
}

/// Drives a codec engine's input-unit to output-picture protocol.
///
/// There is no decode-side end-of-stream flush: pictures an engine still
/// buffers when the source runs out are dropped. An engine wanting bit-exact
/// round trips must emit eagerly (the built-in raw engine does).
pub struct DecodePump {
    decoder: Box<dyn VideoDecoder>,
    units_in: u64,
    frames_out: u64,
}

impl DecodePump {
    /// Create a pump around a decoder engine.
    pub fn new(decoder: Box<dyn VideoDecoder>) -> Self {
        Self {
            decoder,
            units_in: 0,
            frames_out: 0,
        }
    }

    /// Number of coded units submitted so far.
    pub fn units_submitted(&self) -> u64 {
        self.units_in
    }

    /// Number of pictures written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_out
    }

    /// Submit one coded unit and write every picture it completes.
    ///
    /// Units are supplied one at a time, in segmenter order; output pictures
    /// are written with stride-aware row copies in whatever order the engine
    /// returns them.
    pub fn pump<W: Write>(&mut self, unit: &CodedUnit, sink: &mut W) -> Result<()> {
        match self.decoder.submit(unit)? {
            SubmitStatus::Accepted => {}
            SubmitStatus::Busy => {
                return Err(Error::engine(
                    Stage::Submit,
                    "decoder refused input without a drain in between",
                ));
            }
        }
        self.units_in += 1;

        loop {
            match self.decoder.retrieve()? {
                DecoderPoll::Picture(picture) => {
                    picture
                        .store(sink)
                        .map_err(|e| Error::io(Stage::Write, e))?;
                    self.frames_out += 1;
                    debug!(pts = picture.pts, "wrote picture");
                }
                DecoderPoll::NotReady => return Ok(()),
                DecoderPoll::Drained => {
                    return Err(Error::engine(
                        Stage::Retrieve,
                        "decoder drained mid-stream",
                    ));
                }
            }
        }
    }
}
