//! End-to-end session tests over the built-in raw engine.

use escode_codecs::CodecParams;
use escode_core::Error;
use escode_pipeline::{run_jobs, Direction, SessionConfig, TranscodeSession};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 64;
const FRAME_SIZE: usize = (WIDTH * HEIGHT * 3 / 2) as usize;

fn test_params() -> CodecParams {
    CodecParams::default().with_dimensions(WIDTH, HEIGHT)
}

/// Deterministic raw frames with distinct content per frame.
fn make_raw_frames(count: usize) -> Vec<u8> {
    let mut raw = Vec::with_capacity(count * FRAME_SIZE);
    for frame in 0..count {
        for i in 0..FRAME_SIZE {
            raw.push((frame.wrapping_mul(31).wrapping_add(i) % 251) as u8);
        }
    }
    raw
}

fn config(input: &Path, output: &Path, direction: Direction) -> SessionConfig {
    SessionConfig {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        codec: "raw".to_string(),
        direction,
        params: test_params(),
    }
}

#[test]
fn test_encode_decode_round_trip() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("in.yuv");
    let es_path = dir.path().join("mid.es");
    let out_path = dir.path().join("out.yuv");

    let raw = make_raw_frames(5);
    fs::write(&raw_path, &raw).unwrap();

    let mut encode = TranscodeSession::new(config(&raw_path, &es_path, Direction::Encode)).unwrap();
    let report = encode.run().unwrap();
    assert_eq!(report.frames_in, 5);
    assert_eq!(report.units_out, 5);

    let mut decode = TranscodeSession::new(config(&es_path, &out_path, Direction::Decode)).unwrap();
    let report = decode.run().unwrap();
    assert_eq!(report.units_in, 5);
    assert_eq!(report.frames_out, 5);

    let out = fs::read(&out_path).unwrap();
    assert_eq!(out, raw);
}

#[test]
fn test_zero_frame_round_trip_size() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("in.yuv");
    let es_path = dir.path().join("mid.es");
    let out_path = dir.path().join("out.yuv");

    // All-zero payloads are the worst case for the escaping layer: every
    // third byte position is a potential false start code.
    fs::write(&raw_path, vec![0u8; FRAME_SIZE]).unwrap();

    TranscodeSession::new(config(&raw_path, &es_path, Direction::Encode))
        .unwrap()
        .run()
        .unwrap();
    TranscodeSession::new(config(&es_path, &out_path, Direction::Decode))
        .unwrap()
        .run()
        .unwrap();

    let out = fs::read(&out_path).unwrap();
    assert_eq!(out.len(), FRAME_SIZE);
    assert!(out.iter().all(|&b| b == 0));
}

#[test]
fn test_round_trip_with_encoder_delay() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("in.yuv");
    let es_path = dir.path().join("mid.es");
    let out_path = dir.path().join("out.yuv");

    let raw = make_raw_frames(4);
    fs::write(&raw_path, &raw).unwrap();

    let mut params = test_params().with_max_b_frames(2);
    let mut cfg = config(&raw_path, &es_path, Direction::Encode);
    cfg.params = params.clone();
    let report = TranscodeSession::new(cfg).unwrap().run().unwrap();
    // Buffered units must all surface during the flush.
    assert_eq!(report.frames_in, 4);
    assert_eq!(report.units_out, 4);

    params = params.with_max_b_frames(0);
    let mut cfg = config(&es_path, &out_path, Direction::Decode);
    cfg.params = params;
    TranscodeSession::new(cfg).unwrap().run().unwrap();

    assert_eq!(fs::read(&out_path).unwrap(), raw);
}

#[test]
fn test_unknown_codec_fails_before_io() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("in.yuv");
    let out_path = dir.path().join("out.es");
    fs::write(&raw_path, make_raw_frames(1)).unwrap();

    let mut cfg = config(&raw_path, &out_path, Direction::Encode);
    cfg.codec = "h265".to_string();
    let err = match TranscodeSession::new(cfg) {
        Ok(_) => panic!("unknown codec must be rejected"),
        Err(e) => e,
    };
    assert!(matches!(err, Error::Config(_)));
    // Construction failed before run(), so no output file exists.
    assert!(!out_path.exists());
}

#[test]
fn test_invalid_params_fail_before_io() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(
        &dir.path().join("in.yuv"),
        &dir.path().join("out.es"),
        Direction::Encode,
    );
    cfg.params = test_params().with_dimensions(63, 64);
    assert!(matches!(
        TranscodeSession::new(cfg),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_missing_input_reports_open_stage() {
    let dir = TempDir::new().unwrap();
    let cfg = config(
        &dir.path().join("nope.yuv"),
        &dir.path().join("out.es"),
        Direction::Encode,
    );
    let err = TranscodeSession::new(cfg).unwrap().run().unwrap_err();
    assert!(matches!(
        err,
        Error::Io {
            stage: escode_core::Stage::Open,
            ..
        }
    ));
}

#[test]
fn test_truncated_trailing_frame_is_discarded() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("in.yuv");
    let es_path = dir.path().join("out.es");

    let mut raw = make_raw_frames(2);
    raw.extend_from_slice(&make_raw_frames(1)[..FRAME_SIZE / 2]);
    fs::write(&raw_path, &raw).unwrap();

    let report = TranscodeSession::new(config(&raw_path, &es_path, Direction::Encode))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.frames_in, 2);
    assert_eq!(report.units_out, 2);
}

#[test]
fn test_decode_rejects_garbage_prefix() {
    let dir = TempDir::new().unwrap();
    let es_path = dir.path().join("in.es");
    let out_path = dir.path().join("out.yuv");

    fs::write(&es_path, [0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

    let err = TranscodeSession::new(config(&es_path, &out_path, Direction::Decode))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::MalformedStream(_)));
}

#[test]
fn test_job_chain_round_trip() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("in.yuv");
    let es1 = dir.path().join("a.es");
    let mid = dir.path().join("mid.yuv");
    let es2 = dir.path().join("b.es");
    let out_path = dir.path().join("out.yuv");

    let raw = make_raw_frames(3);
    fs::write(&raw_path, &raw).unwrap();

    let jobs = [
        config(&raw_path, &es1, Direction::Encode),
        config(&es1, &mid, Direction::Decode),
        config(&mid, &es2, Direction::Encode),
        config(&es2, &out_path, Direction::Decode),
    ];
    let reports = run_jobs(&jobs).unwrap();
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0].frames_in, 3);
    assert_eq!(reports[3].frames_out, 3);
    assert_eq!(fs::read(&out_path).unwrap(), raw);
}

#[test]
fn test_job_chain_stops_at_first_failure() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("in.yuv");
    fs::write(&raw_path, make_raw_frames(1)).unwrap();

    let jobs = [
        config(&raw_path, &dir.path().join("a.es"), Direction::Encode),
        // Second job reads a path the first one never wrote.
        config(
            &dir.path().join("missing.es"),
            &dir.path().join("b.yuv"),
            Direction::Decode,
        ),
        config(
            &dir.path().join("b.yuv"),
            &dir.path().join("c.es"),
            Direction::Encode,
        ),
    ];
    let err = run_jobs(&jobs).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    // The chain aborted before the third job could create its output.
    assert!(!dir.path().join("c.es").exists());
}
