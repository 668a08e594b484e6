//! Block identifiers (CIDs) as they appear on disk.
//!
//! Two encodings coexist in CAR files:
//!
//! | Form | Layout | Size |
//! |------|--------|------|
//! | Legacy (CIDv0) | `0x12 0x20` + 32-byte SHA2-256 digest | always 34 |
//! | Versioned (CIDv1) | varint version + varint codec + multihash | variable |
//!
//! Digests are kept as owned bytes with no size cap: identity multihashes
//! inline whole blocks and can be far longer than any hash output.
//!
//! The string form used in JSON and `Display` comes from the `cid` crate:
//! base58btc (`Qm…`) for legacy identifiers, base32-lower (`b…`) otherwise.
//! Identifiers the `cid` crate cannot hold (digests over 64 bytes) fall back
//! to `v<version>-<codec>-<code>-<hex digest>`.

use std::fmt;

use cid::{Cid, Version};
use multihash::Multihash;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::varint::uvarint_len;

/// Leading bytes of every legacy identifier: SHA2-256 code, 32-byte length.
pub const LEGACY_TAG: [u8; 2] = [0x12, 0x20];
/// Encoded size of a legacy identifier.
pub const LEGACY_CID_LEN: usize = 34;
/// Codec implied by a legacy identifier (dag-pb).
pub const DAG_PB: u64 = 0x70;
/// Hash function code of legacy identifiers.
pub const SHA2_256: u64 = 0x12;

// ── RawMultihash ─────────────────────────────────────────────────────────────

/// A multihash as stored on disk: hash function code plus digest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawMultihash {
    code:   u64,
    digest: Vec<u8>,
}

impl RawMultihash {
    pub fn new(code: u64, digest: Vec<u8>) -> Self {
        Self { code, digest }
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    pub fn size(&self) -> u64 {
        self.digest.len() as u64
    }

    /// Code varint + length varint + digest.
    pub fn encoded_len(&self) -> usize {
        uvarint_len(self.code) + uvarint_len(self.size()) + self.digest.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        put_uvarint(&mut out, self.code);
        put_uvarint(&mut out, self.size());
        out.extend_from_slice(&self.digest);
        out
    }

    /// Fixed-capacity form used by the `cid` crate.  Fails for digests
    /// longer than 64 bytes.
    pub fn to_multihash(&self) -> Result<Multihash<64>, multihash::Error> {
        Multihash::wrap(self.code, &self.digest)
    }
}

impl From<Multihash<64>> for RawMultihash {
    fn from(mh: Multihash<64>) -> Self {
        Self::new(mh.code(), mh.digest().to_vec())
    }
}

fn put_uvarint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

// ── Identifier ───────────────────────────────────────────────────────────────


#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Fixed 34-byte form; the whole encoding is the multihash.
    Legacy(RawMultihash),
    Versioned {
        version:   u64,
        codec:     u64,
        multihash: RawMultihash,
    },
}

impl Identifier {
    pub fn version(&self) -> u64 {
        match self {
            Identifier::Legacy(_) => 0,
            Identifier::Versioned { version, .. } => *version,
        }
    }

    pub fn codec(&self) -> u64 {
        match self {
            Identifier::Legacy(_) => DAG_PB,
            Identifier::Versioned { codec, .. } => *codec,
        }
    }

    pub fn multihash(&self) -> &RawMultihash {
        match self {
            Identifier::Legacy(mh) => mh,
            Identifier::Versioned { multihash, .. } => multihash,
        }
    }

    /// Bytes this identifier occupies in a block frame.
    pub fn byte_len(&self) -> usize {
        match self {
            Identifier::Legacy(_) => LEGACY_CID_LEN,
            Identifier::Versioned { version, codec, multihash } => {
                uvarint_len(*version) + uvarint_len(*codec) + multihash.encoded_len()
            }
        }
    }

    pub fn to_cid(&self) -> Result<Cid, cid::Error> {
        let mh = self.multihash().to_multihash().map_err(|_| cid::Error::ParsingError)?;
        match self {
            Identifier::Legacy(_) => Cid::new_v0(mh),
            Identifier::Versioned { version, codec, .. } => {
                Cid::new(Version::try_from(*version)?, *codec, mh)
            }
        }
    }
}

impl From<Cid> for Identifier {
    fn from(cid: Cid) -> Self {
        match cid.version() {
            Version::V0 => Identifier::Legacy(RawMultihash::from(*cid.hash())),
            Version::V1 => Identifier::Versioned {
                version:   1,
                codec:     cid.codec(),
                multihash: RawMultihash::from(*cid.hash()),
            },
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_cid() {
            Ok(cid) => write!(f, "{}", cid),
            Err(_) => write!(
                f,
                "v{}-{:x}-{:x}-{}",
                self.version(),
                self.codec(),
                self.multihash().code(),
                hex::encode(self.multihash().digest()),
            ),
        }
    }
}

/// Serialized as an IPLD link: `{"/": "<cid string>"}`.
impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("/", &self.to_string())?;
        map.end()
    }
}
