//! Frame length prefixes.
//!
//! A CAR file is a run of frames, each a varint length followed by that many
//! body bytes.  Reading a prefix consumes the varint and nothing else; what
//! happens to the body (read in full for the header, skipped for blocks) is
//! up to the caller.

use std::io::Read;

use crate::error::CarError;
use crate::io_stream::PeekReader;
use crate::varint::peek_uvarint;

/// Decoded length prefix of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePrefix {
    /// Body length declared by the prefix.  Never zero.
    pub declared_len: u64,
    /// Bytes the prefix itself occupies.
    pub prefix_len:   usize,
}

impl FramePrefix {
    /// Prefix plus body: the distance from this frame's start to the next.
    /// `None` when a ten-byte prefix declares a body near `u64::MAX`.
    pub fn frame_len(&self) -> Option<u64> {
        self.declared_len.checked_add(self.prefix_len as u64)
    }
}

/// Read the next frame's length prefix and advance past it.
///
/// The body is left in the stream.  A declared length of zero is rejected;
/// `offset` is the frame's position in the input, for error context only.
pub fn read_frame_length<R: Read>(
    reader: &mut PeekReader<R>,
    offset: u64,
    window: usize,
) -> Result<FramePrefix, CarError> {
    let (declared_len, prefix_len) = peek_uvarint(reader, 0, window)?;
    reader.consume(prefix_len);
    if declared_len == 0 {
        return Err(CarError::ZeroLengthFrame { offset });
    }
    Ok(FramePrefix { declared_len, prefix_len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::{DEFAULT_VARINT_WINDOW, MAX_VARINT_LEN};
    use std::io::Cursor;

    #[test]
    fn test_consumes_prefix_only() {
        let mut r = PeekReader::new(Cursor::new(vec![0xac, 0x02, 0xaa, 0xbb]));
        let frame = read_frame_length(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap();
        assert_eq!(frame, FramePrefix { declared_len: 300, prefix_len: 2 });
        assert_eq!(frame.frame_len(), Some(302));
        assert_eq!(r.peek(2).unwrap(), &[0xaa, 0xbb]);
    }

    #[test]
    fn test_zero_length_frame_rejected() {
        let mut r = PeekReader::new(Cursor::new(vec![0x00, 0x01, 0x02]));
        let err = read_frame_length(&mut r, 57, DEFAULT_VARINT_WINDOW).unwrap_err();
        assert!(matches!(err, CarError::ZeroLengthFrame { offset: 57 }));
    }

    #[test]
    fn test_max_length_prefix_does_not_overflow() {
        let mut bytes = vec![0xff; 9];
        bytes.push(0x01);
        let mut r = PeekReader::new(Cursor::new(bytes));
        let frame = read_frame_length(&mut r, 0, MAX_VARINT_LEN).unwrap();
        assert_eq!(frame, FramePrefix { declared_len: u64::MAX, prefix_len: 10 });
        assert_eq!(frame.frame_len(), None);
    }

    #[test]
    fn test_empty_input_is_truncated() {
        let mut r = PeekReader::new(Cursor::new(Vec::<u8>::new()));
        let err = read_frame_length(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap_err();
        assert!(matches!(err, CarError::Truncated { .. }));
    }
}
