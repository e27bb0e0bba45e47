//! Codec engine capability traits.
//!
//! The engine is modeled as a swappable capability rather than a base class:
//! `configure` happens at construction (see [`crate::create_encoder`]),
//! `submit` pushes one input, `retrieve` pulls buffered output. The poll
//! enums make the engine's terminal signals explicit - `NotReady` means "no
//! output at this moment", `Drained` means "no output ever again" - closing
//! the ambiguity a two-call send/drain API leaves open.

use escode_core::{CodedUnit, Picture, Result};

/// Information about a codec engine.
#[derive(Debug, Clone)]
pub struct CodecInfo {
    /// Codec name.
    pub name: &'static str,
    /// Long name/description.
    pub long_name: &'static str,
    /// Whether this codec supports encoding.
    pub can_encode: bool,
    /// Whether this codec supports decoding.
    pub can_decode: bool,
}

/// Result of submitting input to an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Input accepted; the caller may submit again after draining.
    Accepted,
    /// The engine cannot accept more input without being drained first.
    /// Submitting while an engine reports this is a caller logic error.
    Busy,
}

/// Input to an encoder's `submit` call.
#[derive(Debug)]
pub enum EncoderInput<'a> {
    /// One picture to encode. The engine copies what it needs before
    /// returning; the caller may overwrite the picture afterwards.
    Frame(&'a Picture),
    /// End of stream: no further frames will arrive, emit everything
    /// buffered.
    EndOfStream,
}

/// Output of an encoder's `retrieve` call.
#[derive(Debug)]
pub enum EncoderPoll {
    /// One coded unit, in emission order.
    Unit(CodedUnit),
    /// No output available right now; more input may produce some.
    NotReady,
    /// All buffered output has been emitted; only valid after end of stream.
    Drained,
}

/// Output of a decoder's `retrieve` call.
#[derive(Debug)]
pub enum DecoderPoll {
    /// One decoded picture, in the engine's output order (which may differ
    /// from submission order).
    Picture(Picture),
    /// No output available right now; more input may produce some.
    NotReady,
    /// All buffered output has been emitted.
    Drained,
}

/// Common trait for video encoder engines.
pub trait VideoEncoder: Send {
    /// Get codec information.
    fn info(&self) -> CodecInfo;

    /// Submit one picture or the end-of-stream marker.
    fn submit(&mut self, input: EncoderInput<'_>) -> Result<SubmitStatus>;

    /// Retrieve the next buffered coded unit, if any.
    fn retrieve(&mut self) -> Result<EncoderPoll>;
}

/// Common trait for video decoder engines.
pub trait VideoDecoder: Send {
    /// Get codec information.
    fn info(&self) -> CodecInfo;

    /// Submit one coded unit. Units are supplied one at a time, in stream
    /// order; the engine's internal buffering depth is opaque to the caller.
    fn submit(&mut self, unit: &CodedUnit) -> Result<SubmitStatus>;

    /// Retrieve the next buffered picture, if any.
    fn retrieve(&mut self) -> Result<DecoderPoll>;
}
