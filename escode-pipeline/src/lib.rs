//! # escode Pipeline
//!
//! Session orchestration for the escode elementary-stream transcode driver.
//!
//! Provides the two pump state machines that drive a codec engine's
//! submit/retrieve protocol ([`EncodePump`], [`DecodePump`]) and the
//! [`TranscodeSession`] outer loop that wires source, picture buffer, pump,
//! and sink together. Everything here is single-threaded, synchronous, and
//! blocking; a session runs to completion or to its first fatal error.

mod pump;
mod session;

pub use pump::{DecodePump, EncodePump};
pub use session::{
    run_jobs, Direction, SessionConfig, SessionReport, TranscodeSession, CHUNK_SIZE,
};
