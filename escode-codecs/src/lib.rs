//! # escode Codecs
//!
//! Codec engine capability traits and built-in engines for the escode
//! elementary-stream transcode driver.
//!
//! The codec engine is a black box behind two capability traits:
//!
//! - [`VideoEncoder`] - picture in, coded unit out
//! - [`VideoDecoder`] - coded unit in, picture out
//!
//! Both sides speak the same push/pull protocol: `submit` an input, then
//! `retrieve` in a loop until the engine signals [`EncoderPoll::NotReady`]
//! (no output *yet*) or [`EncoderPoll::Drained`] (no output *ever again*).
//! The pump layer in `escode-pipeline` depends on that distinction being
//! exact.
//!
//! Engines are constructed by name through [`create_encoder`] and
//! [`create_decoder`], with all parameters fixed at construction.

pub mod params;
pub mod rawes;
pub mod traits;

pub use params::CodecParams;
pub use rawes::{RawDecoder, RawEncoder};
pub use traits::{
    CodecInfo, DecoderPoll, EncoderInput, EncoderPoll, SubmitStatus, VideoDecoder, VideoEncoder,
};

use escode_core::{Error, Result};

/// Construct an encoder engine by name.
///
/// Fails with [`Error::Config`] for unknown names or rejected parameters;
/// called before any file I/O begins.
pub fn create_encoder(name: &str, params: &CodecParams) -> Result<Box<dyn VideoEncoder>> {
    match name {
        "raw" => Ok(Box::new(RawEncoder::new(params)?)),
        _ => Err(Error::config(format!("unknown encoder: {name}"))),
    }
}

/// Construct a decoder engine by name.
///
/// Fails with [`Error::Config`] for unknown names or rejected parameters.
pub fn create_decoder(name: &str, params: &CodecParams) -> Result<Box<dyn VideoDecoder>> {
    match name {
        "raw" => Ok(Box::new(RawDecoder::new(params)?)),
        _ => Err(Error::config(format!("unknown decoder: {name}"))),
    }
}
