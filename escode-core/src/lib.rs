//! # escode Core
//!
//! Core types for the escode elementary-stream transcode driver.
//!
//! This crate provides the leaf building blocks shared by the codec and
//! pipeline layers:
//! - Error handling types
//! - Planar picture buffers with stride-aware storage
//! - Coded access units
//! - Elementary-stream unit segmentation
//! - Rational frame-rate representation

pub mod error;
pub mod picture;
pub mod rational;
pub mod segmenter;
pub mod unit;

pub use error::{Error, Result, Stage};
pub use picture::{Picture, PixelFormat};
pub use rational::Rational;
pub use segmenter::UnitSegmenter;
pub use unit::{CodedUnit, UnitFlags, NO_PTS};
