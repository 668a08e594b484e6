pub mod error;
pub mod io_stream;
pub mod varint;
pub mod frame;
pub mod identifier;
pub mod codec;
pub mod cid_decoder;
pub mod header;
pub mod index;
pub mod archive;

pub use error::CarError;
pub use identifier::{Identifier, RawMultihash};
pub use codec::{MultihashDecoder, HeaderDecoder, MultihashCodec, DagCborHeaderCodec};
pub use header::{CarHeader, read_header, parse_car_header};
pub use index::{CarIndexer, IndexEntry, WalkState, generate_car_index};
pub use archive::{CarArchive, IndexOptions, ArchiveStats};
