//! Decoding the identifier at the front of a block frame.
//!
//! The result carries the exact number of bytes consumed; block payload
//! offsets are computed from it, so it must match what was read byte for
//! byte.

use std::io::Read;

use tracing::trace;

use crate::codec::MultihashDecoder;
use crate::error::CarError;
use crate::identifier::{Identifier, RawMultihash, LEGACY_CID_LEN, LEGACY_TAG, SHA2_256};
use crate::io_stream::{read_full, PeekReader};
use crate::varint::peek_uvarint;

/// Decode one identifier from `reader`, which must sit on its first byte.
///
/// Returns the identifier and the number of bytes it occupied.
pub fn read_identifier<R: Read>(
    reader:    &mut PeekReader<R>,
    window:    usize,
    multihash: &dyn MultihashDecoder,
) -> Result<(Identifier, usize), CarError> {
    let tag = reader.peek(LEGACY_TAG.len())?;
    if tag.len() < LEGACY_TAG.len() {
        return Err(CarError::Truncated { needed: LEGACY_TAG.len(), available: tag.len() });
    }

    if tag == LEGACY_TAG {
        let mut buf = [0u8; LEGACY_CID_LEN];
        let read = read_full(reader, &mut buf)?;
        if read != LEGACY_CID_LEN {
            return Err(CarError::ShortLegacyCid { read });
        }
        let mh = RawMultihash::new(SHA2_256, buf[LEGACY_TAG.len()..].to_vec());
        return Ok((Identifier::Legacy(mh), LEGACY_CID_LEN));
    }

    let (version, version_len) = peek_uvarint(reader, 0, window)?;
    reader.consume(version_len);
    if version != 1 {
        return Err(CarError::UnsupportedCidVersion(version));
    }

    let (codec, codec_len) = peek_uvarint(reader, 0, window)?;
    reader.consume(codec_len);

    // Size the multihash from its two leading varints, then let the
    // decoder consume it.
    let (_, code_len) = peek_uvarint(reader, 0, window)?;
    let (digest_len, size_len) = peek_uvarint(reader, code_len, window)?;

    let mh = multihash.read_multihash(reader)?;
    if mh.size() != digest_len {
        return Err(CarError::MultihashMismatch { declared: digest_len, decoded: mh.digest().len() });
    }

    let consumed = version_len + codec_len + code_len + size_len + mh.digest().len();
    trace!(version, codec, consumed, "decoded versioned CID");
    Ok((Identifier::Versioned { version, codec, multihash: mh }, consumed))
}
