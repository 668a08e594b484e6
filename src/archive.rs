//! High-level [`CarArchive`] API — the primary embedding surface.
//!
//! ```no_run
//! use carindex::archive::{CarArchive, IndexOptions};
//!
//! let car = CarArchive::open("blocks.car", IndexOptions::default())?;
//! println!("roots: {:?}", car.header()?.roots);
//! for entry in car.entries()? {
//!     let entry = entry?;
//!     println!("{} @ {}+{}", entry.cid, entry.block_offset, entry.block_length);
//! }
//! # Ok::<(), carindex::CarError>(())
//! ```
//!
//! Every call opens its own file handle and releases it when the call (or
//! the returned iterator) is done.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::codec::DagCborHeaderCodec;
use crate::error::CarError;
use crate::header::{read_header, CarHeader};
use crate::index::{CarIndexer, IndexEntry};
use crate::io_stream::DEFAULT_BUFFER_CAPACITY;
use crate::varint::{DEFAULT_VARINT_WINDOW, MAX_VARINT_LEN};

/// Default cap on the header frame body: 32 MiB.
pub const DEFAULT_MAX_HEADER_LEN: u64 = 32 << 20;

// ── IndexOptions ─────────────────────────────────────────────────────────────

/// Parser configuration shared by header extraction and indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Look-ahead bytes available to each varint, counted from where it starts.
    pub varint_window:   usize,
    /// Capacity of the look-ahead buffer.
    pub buffer_capacity: usize,
    /// Check every frame against the input length so a truncated final
    /// block fails instead of being indexed.
    pub verify_extent:   bool,
    pub max_header_len:  u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            varint_window:   DEFAULT_VARINT_WINDOW,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            verify_extent:   true,
            max_header_len:  DEFAULT_MAX_HEADER_LEN,
        }
    }
}

impl IndexOptions {
    /// Clamp the window to `1..=10` and grow the buffer so two adjacent
    /// varints always fit in one peek.
    pub fn normalized(&self) -> Self {
        let window = self.varint_window.clamp(1, MAX_VARINT_LEN);
        if window != self.varint_window {
            warn!(requested = self.varint_window, using = window, "varint window out of range");
        }
        let min_capacity = 2 * window + 2;
        if self.buffer_capacity < min_capacity {
            warn!(requested = self.buffer_capacity, using = min_capacity, "look-ahead buffer too small");
        }
        Self {
            varint_window:   window,
            buffer_capacity: self.buffer_capacity.max(min_capacity),
            ..self.clone()
        }
    }
}

// ── ArchiveStats ─────────────────────────────────────────────────────────────

/// Totals gathered by [`CarArchive::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveStats {
    pub blocks:        u64,
    pub payload_bytes: u64,
    /// Offset just past the last block frame.
    pub end_offset:    u64,
}

// ── CarArchive ───────────────────────────────────────────────────────────────

pub struct CarArchive {
    path:    PathBuf,
    options: IndexOptions,
}

impl CarArchive {
    /// Bind to the file at `path`.  Fails if it cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, options: IndexOptions) -> Result<Self, CarError> {
        let path = path.as_ref().to_path_buf();
        File::open(&path)?;
        Ok(Self { path, options })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn header(&self) -> Result<CarHeader, CarError> {
        read_header(File::open(&self.path)?, &self.options, &DagCborHeaderCodec)
    }

    /// Lazily iterate over every block entry.
    pub fn entries(&self) -> Result<CarIndexer<File>, CarError> {
        CarIndexer::with_options(File::open(&self.path)?, &self.options)
    }

    /// Pass every block entry to `sink`; a sink error aborts the walk.
    pub fn for_each_entry<F, E>(&self, sink: F) -> Result<(), CarError>
    where
        F: FnMut(IndexEntry) -> Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.entries()?.walk(sink)
    }

    pub fn stats(&self) -> Result<ArchiveStats, CarError> {
        let mut stats = ArchiveStats::default();
        for entry in self.entries()? {
            let entry = entry?;
            stats.blocks += 1;
            stats.payload_bytes += entry.block_length;
            stats.end_offset = entry.end();
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_defaults_unchanged() {
        let opts = IndexOptions::default();
        assert_eq!(opts.normalized(), opts);
    }

    #[test]
    fn test_normalized_clamps() {
        let opts = IndexOptions { varint_window: 64, buffer_capacity: 4, ..IndexOptions::default() };
        let n = opts.normalized();
        assert_eq!(n.varint_window, MAX_VARINT_LEN);
        assert_eq!(n.buffer_capacity, 2 * MAX_VARINT_LEN + 2);

        let n = IndexOptions { varint_window: 0, ..IndexOptions::default() }.normalized();
        assert_eq!(n.varint_window, 1);
    }

    #[test]
    fn test_open_missing_file() {
        let err = CarArchive::open("/definitely/not/here.car", IndexOptions::default())
            .err()
            .unwrap();
        assert!(err.is_io_error());
    }
}
