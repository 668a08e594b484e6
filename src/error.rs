//! Error taxonomy shared by every stage of the parser.
//!
//! Three kinds of failure exist:
//!
//! | Kind | Variants |
//! |------|----------|
//! | I/O | [`CarError::Io`] |
//! | Format | everything describing a malformed or truncated container |
//! | Sink | [`CarError::Sink`], raised when an entry consumer asks to stop |
//!
//! None of them are retried.  Offsets are only trustworthy while every
//! previous frame parsed cleanly, so the first error ends the invocation.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Look-ahead hit end of input before a value could be decoded.
    #[error("Bad CAR format: not enough bytes (needed {needed}, {available} available)")]
    Truncated { needed: usize, available: usize },

    /// A varint did not terminate inside the configured look-ahead window.
    #[error("Bad CAR format: varint longer than the {window}-byte look-ahead window")]
    VarintTooLong { window: usize },

    #[error("Bad CAR format: varint overflows u64")]
    VarintOverflow,

    #[error("Bad CAR format: got length 0 block at offset {offset}")]
    ZeroLengthFrame { offset: u64 },

    #[error("Bad CAR format: invalid CID version number: {0}")]
    UnsupportedCidVersion(u64),

    #[error("Bad CAR format: not enough bytes for CIDv0 (read {read} of 34)")]
    ShortLegacyCid { read: usize },

    #[error("Bad CAR format: multihash declared {declared} digest bytes but decoded {decoded}")]
    MultihashMismatch { declared: u64, decoded: usize },

    #[error("Bad CAR format: CID at offset {offset} is {identifier} bytes but the frame holds only {declared}")]
    IdentifierOverrunsFrame { offset: u64, declared: u64, identifier: u64 },

    /// The frame ends past the input, or past `u64::MAX`.
    #[error("Bad CAR format: frame at offset {offset} declaring {declared} bytes runs past the end of the input, truncated?")]
    FrameExceedsInput { offset: u64, declared: u64 },

    #[error("Bad CAR format: couldn't seek to correct position (expected {expected}, got {actual}), truncated?")]
    SeekMismatch { expected: u64, actual: u64 },

    #[error("Bad CAR format: header declares {declared} bytes, limit is {limit}")]
    HeaderTooLarge { declared: u64, limit: u64 },

    #[error("Bad CAR format: couldn't read full header (read {read} of {declared})")]
    ShortHeader { declared: u64, read: usize },

    #[error("Invalid multihash: {0}")]
    Multihash(String),

    #[error("Header decode error: {0}")]
    HeaderDecode(String),

    /// The entry consumer reported a failure; the walk stopped at that entry.
    #[error("Index consumer aborted: {0}")]
    Sink(Box<dyn std::error::Error + Send + Sync>),
}

impl CarError {
    pub fn is_io_error(&self) -> bool {
        matches!(self, CarError::Io(_))
    }

    pub fn is_sink_error(&self) -> bool {
        matches!(self, CarError::Sink(_))
    }

    /// True for every variant that signals a malformed or truncated container.
    pub fn is_format_error(&self) -> bool {
        !self.is_io_error() && !self.is_sink_error()
    }
}
