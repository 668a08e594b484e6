//! Decoders the parser delegates to, behind narrow traits.
//!
//! The parser itself only decodes enough structure to compute byte extents.
//! Two pieces of real decoding are handed off:
//!
//! | Trait | Input | Default implementation |
//! |-------|-------|------------------------|
//! | [`MultihashDecoder`] | stream positioned at a multihash | [`MultihashCodec`] (`unsigned-varint`) |
//! | [`HeaderDecoder`] | raw header frame body | [`DagCborHeaderCodec`] (`serde_ipld_dagcbor`) |
//!
//! Implementations consume exactly what they decode and return their own
//! errors unchanged inside [`CarError`].

use std::io::{self, Read};

use cid::Cid;
use serde::Deserialize;
use unsigned_varint::io::{read_u64, ReadError};

use crate::error::CarError;
use crate::header::CarHeader;
use crate::identifier::{Identifier, RawMultihash};

// ── Multihash ────────────────────────────────────────────────────────────────

pub trait MultihashDecoder: Send + Sync {
    /// Consume one complete multihash (code, length, digest) from `reader`.
    fn read_multihash(&self, reader: &mut dyn Read) -> Result<RawMultihash, CarError>;
}

/// Reads the two varints with `unsigned-varint`, then exactly `size` digest
/// bytes.  A short digest is an I/O error (`UnexpectedEof`).
pub struct MultihashCodec;

fn read_varint(reader: &mut dyn Read) -> Result<u64, CarError> {
    read_u64(reader).map_err(|e| match e {
        ReadError::Io(e) => CarError::Io(e),
        e => CarError::Multihash(e.to_string()),
    })
}

impl MultihashDecoder for MultihashCodec {
    fn read_multihash(&self, reader: &mut dyn Read) -> Result<RawMultihash, CarError> {
        let code = read_varint(reader)?;
        let size = read_varint(reader)?;

        // Grows with what is actually read, never with what is declared.
        let mut digest = Vec::new();
        (&mut *reader).take(size).read_to_end(&mut digest)?;
        if (digest.len() as u64) < size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("multihash digest: read {} of {} bytes", digest.len(), size),
            )
            .into());
        }
        Ok(RawMultihash::new(code, digest))
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

pub trait HeaderDecoder: Send + Sync {
    fn decode_header(&self, bytes: &[u8]) -> Result<CarHeader, CarError>;
}

/// Decodes the DAG-CBOR map `{roots: [CID], version: int}`.
pub struct DagCborHeaderCodec;

#[derive(Deserialize)]
struct RawHeader {
    #[serde(default)]
    roots:   Vec<Cid>,
    #[serde(default)]
    version: u64,
}

impl HeaderDecoder for DagCborHeaderCodec {
    fn decode_header(&self, bytes: &[u8]) -> Result<CarHeader, CarError> {
        let raw: RawHeader = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| CarError::HeaderDecode(e.to_string()))?;
        Ok(CarHeader {
            roots:   raw.roots.into_iter().map(Identifier::from).collect(),
            version: raw.version,
        })
    }
}
