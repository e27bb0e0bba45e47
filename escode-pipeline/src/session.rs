//! Transcode sessions.
//!
//! A session owns the file handles, the reusable picture buffer, and one
//! pump, and sequences read, process, write per iteration until the source
//! is exhausted or a fatal error aborts everything. The codec engine is
//! constructed before any file is touched, so a bad codec name or parameter
//! set never creates an output file.

use crate::pump::{DecodePump, EncodePump};
use escode_codecs::{create_decoder, create_encoder, CodecParams};
use escode_core::{Error, Picture, Result, Stage, UnitSegmenter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Chunk size for decode-side reads, in bytes.
pub const CHUNK_SIZE: usize = 4096;

/// Direction of a transcode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Raw planar samples in, coded units out.
    Encode,
    /// Coded units in, raw planar samples out.
    Decode,
}

/// Configuration for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Input source path.
    pub input: PathBuf,
    /// Output sink path.
    pub output: PathBuf,
    /// Codec engine name.
    pub codec: String,
    /// Encode or decode.
    pub direction: Direction,
    /// Engine parameters, fixed for the whole session.
    #[serde(default)]
    pub params: CodecParams,
}

/// Counters reported by a completed session.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SessionReport {
    /// Pictures read and submitted (encode direction).
    pub frames_in: u64,
    /// Coded units written (encode direction).
    pub units_out: u64,
    /// Coded units segmented and submitted (decode direction).
    pub units_in: u64,
    /// Pictures written (decode direction).
    pub frames_out: u64,
}

enum Pump {
    Encode(EncodePump),
    Decode(DecodePump),
}

/// One transcode run: source, engine, sink.
pub struct TranscodeSession {
    config: SessionConfig,
    pump: Pump,
}

impl TranscodeSession {
    /// Validate the configuration and construct the codec engine.
    ///
    /// Fails with [`Error::Config`] before any file I/O when the codec name
    /// is unknown or the parameters are rejected.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.params.validate()?;
        let pump = match config.direction {
            Direction::Encode => {
                Pump::Encode(EncodePump::new(create_encoder(&config.codec, &config.params)?))
            }
            Direction::Decode => {
                Pump::Decode(DecodePump::new(create_decoder(&config.codec, &config.params)?))
            }
        };
        Ok(Self { config, pump })
    }

    /// Run the session to completion.
    ///
    /// Returns the first fatal error encountered; there is no
    /// partial-success state and no retry.
    pub fn run(&mut self) -> Result<SessionReport> {
        let source = File::open(&self.config.input).map_err(|e| Error::io(Stage::Open, e))?;
        let sink = File::create(&self.config.output).map_err(|e| Error::io(Stage::Open, e))?;
        let mut reader = BufReader::new(source);
        let mut writer = BufWriter::new(sink);

        info!(
            input = %self.config.input.display(),
            output = %self.config.output.display(),
            codec = %self.config.codec,
            "starting session"
        );

        let report = match &mut self.pump {
            Pump::Encode(pump) => run_encode(pump, &self.config.params, &mut reader, &mut writer),
            Pump::Decode(pump) => run_decode(pump, &mut reader, &mut writer),
        }?;
        writer.flush().map_err(|e| Error::io(Stage::Write, e))?;

        info!(
            frames_in = report.frames_in,
            units_out = report.units_out,
            units_in = report.units_in,
            frames_out = report.frames_out,
            "session complete"
        );
        Ok(report)
    }
}

fn run_encode<R: Read, W: Write>(
    pump: &mut EncodePump,
    params: &CodecParams,
    reader: &mut R,
    writer: &mut W,
) -> Result<SessionReport> {
    // One picture and one scratch buffer for the whole session, overwritten
    // every iteration.
    let mut picture = Picture::allocate(params.width, params.height)?;
    let frame_size = params.frame_size();
    let mut raw = vec![0u8; frame_size];

    loop {
        let n = read_full(reader, &mut raw).map_err(|e| Error::io(Stage::Read, e))?;
        if n == 0 {
            break;
        }
        if let Err(e) = picture.load(&raw[..n]) {
            if e.is_short_read() {
                // Source exhausted mid-picture: clean end of stream, the
                // trailing partial frame is discarded.
                warn!(bytes = n, frame_size, "discarding truncated trailing frame");
                break;
            }
            return Err(e);
        }
        pump.pump(&mut picture, writer)?;
    }

    debug!("source exhausted, flushing encoder");
    pump.flush(writer)?;

    Ok(SessionReport {
        frames_in: pump.frames_submitted(),
        units_out: pump.units_written(),
        ..SessionReport::default()
    })
}

fn run_decode<R: Read, W: Write>(
    pump: &mut DecodePump,
    reader: &mut R,
    writer: &mut W,
) -> Result<SessionReport> {
    let mut segmenter = UnitSegmenter::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(Stage::Read, e)),
        };
        if n == 0 {
            break;
        }
        for unit in segmenter.feed(&chunk[..n])? {
            pump.pump(&unit, writer)?;
        }
    }

    if let Some(unit) = segmenter.finalize()? {
        pump.pump(&unit, writer)?;
    }

    Ok(SessionReport {
        units_in: pump.units_submitted(),
        frames_out: pump.frames_written(),
        ..SessionReport::default()
    })
}

/// Read until `buf` is full or the source is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Run a chain of sessions in order, stopping at the first fatal error.
///
/// Typically one run's output is the next run's input (encode then decode
/// for round-trip validation).
pub fn run_jobs(configs: &[SessionConfig]) -> Result<Vec<SessionReport>> {
    let mut reports = Vec::with_capacity(configs.len());
    for (index, config) in configs.iter().enumerate() {
        info!(step = index + 1, total = configs.len(), "running job");
        let mut session = TranscodeSession::new(config.clone())?;
        reports.push(session.run()?);
    }
    Ok(reports)
}
