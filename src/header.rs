//! The CAR header: the body of the first frame.
//!
//! Unlike block frames, whose payloads are skipped, the header body is read
//! into memory in full and handed to a [`HeaderDecoder`].  Its declared
//! length is capped by [`IndexOptions::max_header_len`] so a corrupt prefix
//! cannot trigger an unbounded allocation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::archive::IndexOptions;
use crate::codec::{DagCborHeaderCodec, HeaderDecoder};
use crate::error::CarError;
use crate::frame::read_frame_length;
use crate::identifier::Identifier;
use crate::io_stream::{read_full, PeekReader};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarHeader {
    pub roots:   Vec<Identifier>,
    pub version: u64,
}

/// Read the first frame of `reader` and decode it with `decoder`.
///
/// The decoder's result and errors are passed through unchanged.
pub fn read_header<R: Read>(
    reader:  R,
    options: &IndexOptions,
    decoder: &dyn HeaderDecoder,
) -> Result<CarHeader, CarError> {
    let options = options.normalized();
    let mut reader = PeekReader::with_capacity(options.buffer_capacity, reader);

    let frame = read_frame_length(&mut reader, 0, options.varint_window)?;
    if frame.declared_len > options.max_header_len {
        return Err(CarError::HeaderTooLarge {
            declared: frame.declared_len,
            limit:    options.max_header_len,
        });
    }

    let mut body = vec![0u8; frame.declared_len as usize];
    let read = read_full(&mut reader, &mut body)?;
    if read != body.len() {
        return Err(CarError::ShortHeader { declared: frame.declared_len, read });
    }
    debug!(header_len = read, prefix_len = frame.prefix_len, "read CAR header frame");

    decoder.decode_header(&body)
}

/// Open `path` and decode its header with the default DAG-CBOR decoder.
pub fn parse_car_header<P: AsRef<Path>>(path: P) -> Result<CarHeader, CarError> {
    let file = File::open(path)?;
    read_header(file, &IndexOptions::default(), &DagCborHeaderCodec)
}
