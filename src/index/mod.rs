//! Streaming block index.
//!
//! [`CarIndexer`] makes one forward pass over a CAR stream.  The first frame
//! (the header) is skipped; every later frame yields an [`IndexEntry`]
//! locating the frame and its payload.  Payload bytes are never read: after
//! decoding a frame's identifier the indexer seeks straight to the next
//! frame, so memory stays at the look-ahead buffer no matter how large the
//! blocks or the file are.
//!
//! # States
//!
//! ```text
//! AwaitingHeader --first frame--> AwaitingBlock --end of input--> Done
//!                                  |      ^
//!                                  +------+  one entry per frame
//! ```
//!
//! Any error also ends the walk in `Done`; the iterator is fused.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::iter::FusedIterator;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, trace};

use crate::archive::IndexOptions;
use crate::cid_decoder::read_identifier;
use crate::codec::{MultihashCodec, MultihashDecoder};
use crate::error::CarError;
use crate::frame::read_frame_length;
use crate::identifier::Identifier;
use crate::io_stream::PeekReader;

// ── IndexEntry ───────────────────────────────────────────────────────────────

/// Location of one block frame and its payload.
///
/// - `length       = prefix_len + declared frame length`
/// - `block_offset = offset + prefix_len + cid.byte_len()`
/// - `block_length = declared frame length - cid.byte_len()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub cid:          Identifier,
    /// Start of the frame, at its length prefix.
    pub offset:       u64,
    /// Whole frame including the length prefix.
    pub length:       u64,
    pub block_offset: u64,
    pub block_length: u64,
}

impl IndexEntry {
    /// Offset of the byte after this frame; the next frame starts here.
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    pub fn identifier_len(&self) -> u64 {
        self.cid.byte_len() as u64
    }

    /// Bytes taken by the frame's length prefix.
    pub fn prefix_len(&self) -> u64 {
        self.block_offset - self.offset - self.identifier_len()
    }
}

// ── Walker ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    AwaitingHeader,
    AwaitingBlock,
    Done,
}

/// Lazy iterator over the block entries of a CAR stream.
pub struct CarIndexer<R: Read + Seek> {
    reader:    PeekReader<R>,
    state:     WalkState,
    offset:    u64,
    /// Input length, when extents are verified.
    input_len: Option<u64>,
    window:    usize,
    multihash: Box<dyn MultihashDecoder>,
}

impl<R: Read + Seek> CarIndexer<R> {
    pub fn new(reader: R) -> Result<Self, CarError> {
        Self::with_options(reader, &IndexOptions::default())
    }

    /// Start a walk at the beginning of `reader`.
    pub fn with_options(mut reader: R, options: &IndexOptions) -> Result<Self, CarError> {
        let options = options.normalized();
        reader.seek(SeekFrom::Start(0))?;
        let mut reader = PeekReader::with_capacity(options.buffer_capacity, reader);
        let input_len = if options.verify_extent {
            Some(reader.stream_len_from(0)?)
        } else {
            None
        };
        debug!(?input_len, window = options.varint_window, "starting CAR index walk");
        Ok(Self {
            reader,
            state: WalkState::AwaitingHeader,
            offset: 0,
            input_len,
            window: options.varint_window,
            multihash: Box::new(MultihashCodec),
        })
    }

    /// Replace the multihash decoder used for versioned identifiers.
    pub fn with_multihash_decoder(mut self, decoder: Box<dyn MultihashDecoder>) -> Self {
        self.multihash = decoder;
        self
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Offset of the next frame to be read.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Hand every remaining entry to `sink`, stopping at the first error.
    ///
    /// A sink failure ends the walk and is returned as [`CarError::Sink`].
    pub fn walk<F, E>(&mut self, mut sink: F) -> Result<(), CarError>
    where
        F: FnMut(IndexEntry) -> Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        while let Some(entry) = self.next() {
            if let Err(e) = sink(entry?) {
                self.state = WalkState::Done;
                return Err(CarError::Sink(e.into()));
            }
        }
        Ok(())
    }

    fn step(&mut self) -> Result<Option<IndexEntry>, CarError> {
        loop {
            if self.state == WalkState::Done {
                return Ok(None);
            }

            let offset = self.offset;
            if self.reader.peek(1)?.is_empty() {
                debug!(offset, "reached end of CAR input");
                self.state = WalkState::Done;
                return Ok(None);
            }

            let frame = read_frame_length(&mut self.reader, offset, self.window)?;

            // Where the next frame starts.  Overflow means the prefix lies.
            let input_len = self.input_len;
            let target = frame
                .frame_len()
                .and_then(|len| offset.checked_add(len))
                .filter(|t| input_len.map_or(true, |len| *t <= len))
                .ok_or(CarError::FrameExceedsInput { offset, declared: frame.declared_len })?;

            let entry = if self.state == WalkState::AwaitingHeader {
                self.state = WalkState::AwaitingBlock;
                None
            } else {
                let (cid, cid_len) = read_identifier(&mut self.reader, self.window, self.multihash.as_ref())?;
                let cid_len = cid_len as u64;
                if cid_len > frame.declared_len {
                    return Err(CarError::IdentifierOverrunsFrame {
                        offset,
                        declared:   frame.declared_len,
                        identifier: cid_len,
                    });
                }
                let prefix_len = frame.prefix_len as u64;
                Some(IndexEntry {
                    cid,
                    offset,
                    length:       target - offset,
                    block_offset: offset + prefix_len + cid_len,
                    block_length: frame.declared_len - cid_len,
                })
            };

            let actual = self.reader.seek_to(target)?;
            if actual != target {
                return Err(CarError::SeekMismatch { expected: target, actual });
            }
            self.offset = target;

            if let Some(entry) = entry {
                trace!(offset = entry.offset, length = entry.length, cid = %entry.cid, "indexed block");
                return Ok(Some(entry));
            }
        }
    }
}

impl<R: Read + Seek> Iterator for CarIndexer<R> {
    type Item = Result<IndexEntry, CarError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.state = WalkState::Done;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read + Seek> FusedIterator for CarIndexer<R> {}

/// Index the CAR file at `path`, passing each entry to `sink` in file order.
///
/// The file is opened once and closed on every exit path.
pub fn generate_car_index<P, F, E>(path: P, sink: F) -> Result<(), CarError>
where
    P: AsRef<Path>,
    F: FnMut(IndexEntry) -> Result<(), E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let file = File::open(path)?;
    CarIndexer::new(file)?.walk(sink)
}
