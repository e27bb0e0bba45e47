//! Error types for the escode workspace.
//!
//! Every fatal condition aborts the whole session; there is no retry policy
//! and no partial-success state. Variants that can occur at more than one
//! point in the pipeline carry a [`Stage`] so the terminal message names the
//! step that failed.

use std::fmt;
use thiserror::Error;

/// Pipeline stage at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Opening the input source or output sink.
    Open,
    /// Validating parameters or constructing the codec engine.
    Configure,
    /// Reading from the input source.
    Read,
    /// Submitting input to the codec engine.
    Submit,
    /// Retrieving output from the codec engine.
    Retrieve,
    /// Writing to the output sink.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Configure => write!(f, "configure"),
            Self::Read => write!(f, "read"),
            Self::Submit => write!(f, "submit"),
            Self::Retrieve => write!(f, "retrieve"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Main error type for the escode workspace.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure on the input source or output sink.
    #[error("I/O error during {stage}: {source}")]
    Io {
        /// Stage at which the I/O operation failed.
        stage: Stage,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Buffer or engine resource exhaustion.
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// Named codec not found, or the engine rejected its configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The codec engine reported an unrecoverable internal error, distinct
    /// from its normal backpressure signals.
    #[error("Engine error during {stage}: {reason}")]
    Engine {
        /// Stage at which the engine failed.
        stage: Stage,
        /// Human-readable failure reason.
        reason: String,
    },

    /// The byte stream is not in the expected elementary format. Indicates
    /// data corruption rather than an environment failure.
    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    /// Fewer bytes than one full picture were available.
    ///
    /// Used internally to distinguish clean end-of-stream from corruption;
    /// not surfaced as a failure when it coincides with source exhaustion.
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Bytes required for one full picture.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an I/O error tagged with the failing stage.
    pub fn io(stage: Stage, source: std::io::Error) -> Self {
        Error::Io { stage, source }
    }

    /// Create an engine error tagged with the failing stage.
    pub fn engine(stage: Stage, reason: impl Into<String>) -> Self {
        Error::Engine {
            stage,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an allocation error.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Error::Allocation(msg.into())
    }

    /// Create a malformed-stream error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedStream(msg.into())
    }

    /// Check if this is a short read.
    #[must_use]
    pub fn is_short_read(&self) -> bool {
        matches!(self, Error::ShortRead { .. })
    }
}
