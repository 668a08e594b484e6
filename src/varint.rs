//! Unsigned LEB128 varints read through the look-ahead window.
//!
//! Each byte carries 7 value bits, least significant group first; the high
//! bit set means another byte follows.  Decoding only ever looks at
//! `offset..offset + window` of the peeked bytes, so the read position of
//! the stream is untouched.
//!
//! The window defaults to 7 bytes, enough for values below 2^49.  Longer
//! encodings fail with [`CarError::VarintTooLong`] unless the caller widens
//! the window (up to [`MAX_VARINT_LEN`]).

use std::io::Read;

use crate::error::CarError;
use crate::io_stream::PeekReader;

/// Look-ahead bytes available beyond a starting offset.
pub const DEFAULT_VARINT_WINDOW: usize = 7;
/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Result of decoding a varint from a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uvarint {
    /// Decoded value and the number of bytes it occupied.
    Value(u64, usize),
    /// The slice ended before the terminating byte.
    Incomplete,
    /// The encoding does not fit in a `u64`.
    Overflow,
}

/// Decode a varint from the front of `buf`.
pub fn decode_uvarint(buf: &[u8]) -> Uvarint {
    let mut value: u64 = 0;
    for (i, &b) in buf.iter().enumerate().take(MAX_VARINT_LEN) {
        if i == MAX_VARINT_LEN - 1 && b > 1 {
            return Uvarint::Overflow;
        }
        value |= u64::from(b & 0x7f) << (7 * i);
        if b < 0x80 {
            return Uvarint::Value(value, i + 1);
        }
    }
    Uvarint::Incomplete
}

/// Number of bytes `value` occupies when varint-encoded.
pub fn uvarint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Decode the varint starting `offset` bytes ahead of the read position,
/// without consuming anything.  Returns `(value, encoded_len)`.
pub fn peek_uvarint<R: Read>(
    reader: &mut PeekReader<R>,
    offset: usize,
    window: usize,
) -> Result<(u64, usize), CarError> {
    let want = offset + window;
    let buf = reader.peek(want)?;
    if buf.len() <= offset {
        return Err(CarError::Truncated { needed: offset + 1, available: buf.len() });
    }
    let available = buf.len();
    match decode_uvarint(&buf[offset..]) {
        Uvarint::Value(value, len) => Ok((value, len)),
        Uvarint::Overflow => Err(CarError::VarintOverflow),
        Uvarint::Incomplete if available < want => {
            Err(CarError::Truncated { needed: want, available })
        }
        Uvarint::Incomplete => Err(CarError::VarintTooLong { window }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn encode(mut v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        while v >= 0x80 {
            out.push((v as u8) | 0x80);
            v >>= 7;
        }
        out.push(v as u8);
        out
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode_uvarint(&[0x00]), Uvarint::Value(0, 1));
        assert_eq!(decode_uvarint(&[0x7f]), Uvarint::Value(127, 1));
        assert_eq!(decode_uvarint(&[0x80, 0x01]), Uvarint::Value(128, 2));
        assert_eq!(decode_uvarint(&[0xac, 0x02, 0xff]), Uvarint::Value(300, 2));
    }

    #[test]
    fn test_decode_incomplete_and_overflow() {
        assert_eq!(decode_uvarint(&[]), Uvarint::Incomplete);
        assert_eq!(decode_uvarint(&[0x80, 0x80]), Uvarint::Incomplete);
        assert_eq!(decode_uvarint(&[0xff; 10]), Uvarint::Overflow);
        assert_eq!(decode_uvarint(&encode(u64::MAX)), Uvarint::Value(u64::MAX, 10));
    }

    #[test]
    fn test_peek_leaves_position() {
        let mut r = PeekReader::new(Cursor::new(vec![0xac, 0x02, 0x05, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(peek_uvarint(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap(), (300, 2));
        assert_eq!(peek_uvarint(&mut r, 2, DEFAULT_VARINT_WINDOW).unwrap(), (5, 1));
        assert_eq!(peek_uvarint(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap(), (300, 2));
    }

    #[test]
    fn test_peek_near_end_of_input() {
        // Fewer bytes than the window remain, but the varint completes.
        let mut r = PeekReader::new(Cursor::new(vec![0x22, 0x01]));
        assert_eq!(peek_uvarint(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap(), (0x22, 1));
        assert_eq!(peek_uvarint(&mut r, 1, DEFAULT_VARINT_WINDOW).unwrap(), (1, 1));
    }

    #[test]
    fn test_peek_truncated() {
        let mut r = PeekReader::new(Cursor::new(vec![0x80, 0x80]));
        let err = peek_uvarint(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap_err();
        assert!(matches!(err, CarError::Truncated { available: 2, .. }));

        let mut r = PeekReader::new(Cursor::new(vec![0x01]));
        let err = peek_uvarint(&mut r, 1, DEFAULT_VARINT_WINDOW).unwrap_err();
        assert!(matches!(err, CarError::Truncated { needed: 2, available: 1 }));
    }

    #[test]
    fn test_peek_longer_than_window() {
        let bytes = encode(1 << 56);
        assert_eq!(bytes.len(), 9);
        let mut r = PeekReader::new(Cursor::new(bytes.clone()));
        let err = peek_uvarint(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap_err();
        assert!(matches!(err, CarError::VarintTooLong { window: 7 }));

        let mut r = PeekReader::new(Cursor::new(bytes));
        assert_eq!(peek_uvarint(&mut r, 0, MAX_VARINT_LEN).unwrap(), (1 << 56, 9));
    }

    #[test]
    fn test_uvarint_len_boundaries() {
        assert_eq!(uvarint_len(0), 1);
        assert_eq!(uvarint_len(127), 1);
        assert_eq!(uvarint_len(128), 2);
        assert_eq!(uvarint_len(16_383), 2);
        assert_eq!(uvarint_len(16_384), 3);
        assert_eq!(uvarint_len(u64::MAX), 10);
    }

    proptest! {
        #[test]
        fn prop_decode_matches_encoding(v in any::<u64>()) {
            let bytes = encode(v);
            prop_assert_eq!(decode_uvarint(&bytes), Uvarint::Value(v, bytes.len()));
            prop_assert_eq!(uvarint_len(v), bytes.len());
        }

        #[test]
        fn prop_peek_within_window(v in 0u64..(1 << 49), tail in proptest::collection::vec(any::<u8>(), 0..8)) {
            let mut bytes = encode(v);
            let len = bytes.len();
            bytes.extend(tail);
            let mut r = PeekReader::new(Cursor::new(bytes));
            prop_assert_eq!(peek_uvarint(&mut r, 0, DEFAULT_VARINT_WINDOW).unwrap(), (v, len));
            prop_assert!(r.buffered() >= len);
        }
    }
}
