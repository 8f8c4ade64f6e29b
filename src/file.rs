//! Top-level decode: superblock → directory → streams.
//!
//! ```no_run
//! use pdbmsf::PdbFile;
//!
//! let pdb = PdbFile::open("app.pdb")?;
//! if let Some(info) = pdb.info() {
//!     println!("{} age {}", info.header.unique_id, info.header.age);
//! }
//! for (stream, notice) in pdb.diagnostics.iter() {
//!     eprintln!("stream {stream}: {notice}");
//! }
//! # Ok::<(), pdbmsf::PdbError>(())
//! ```

use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::diagnostics::{Diagnostics, Notice};
use crate::error::{PdbError, Result};
use crate::info::InfoStream;
use crate::msf::{read_stream, FreePageMap, PageStore, StreamDirectory, Superblock};
use crate::stream::{dispatch, Stream};
use crate::tpi::TypeStream;

/// Stream numbers are 16-bit on disk, so a sane directory never exceeds this.
pub const DEFAULT_MAX_STREAMS: u32 = 0x1_0000;

/// Bytes of each stream shown in debug-level trace events.
const PREVIEW_BYTES: usize = 32;

// ── ParseOptions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Load the free page map named by the superblock.
    pub read_free_page_map: bool,
    /// Decode streams on rayon's pool. Needs the `parallel` feature; without
    /// it streams are decoded in order on the calling thread.
    pub parallel:           bool,
    /// Directories declaring more streams than this are rejected.
    pub max_stream_count:   u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            read_free_page_map: true,
            parallel:           false,
            max_stream_count:   DEFAULT_MAX_STREAMS,
        }
    }
}

// ── PdbFile ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PdbFile {
    pub superblock:    Superblock,
    pub free_page_map: Option<FreePageMap>,
    pub directory:     StreamDirectory,
    /// Indexed by stream number.
    pub streams:       Vec<Stream>,
    pub diagnostics:   Diagnostics,
    #[serde(skip)]
    store:             PageStore,
}

impl PdbFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ParseOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, opts: &ParseOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse_with(data, opts)
    }

    pub fn parse(data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::parse_with(data, &ParseOptions::default())
    }

    /// Decodes a whole container held in memory.
    ///
    /// Superblock and directory failures abort the decode. A failure inside a
    /// single stream's typed content is recorded as [`Stream::Failed`] and in
    /// [`diagnostics`](Self::diagnostics); the other streams still decode.
    pub fn parse_with(data: impl Into<Vec<u8>>, opts: &ParseOptions) -> Result<Self> {
        let data = data.into();
        let superblock = Superblock::read(&data)?;
        let store = PageStore::new(data, superblock.page_size())?;
        debug!(
            page_size = superblock.page_size,
            page_count = superblock.page_count,
            directory_size = superblock.directory.size,
            "read superblock"
        );

        let free_page_map = if opts.read_free_page_map {
            Some(FreePageMap::read(&store, superblock.free_page_map_page as u32)?)
        } else {
            None
        };

        let directory_data = read_stream(&store, &superblock.directory_pages, superblock.directory.len())?;
        let directory = StreamDirectory::read(&directory_data, store.page_size(), opts.max_stream_count)?;
        debug!(streams = directory.stream_count, "read stream directory");

        let decoded = decode_streams(&store, &directory, opts)?;
        let mut streams = Vec::with_capacity(decoded.len());
        let mut diagnostics = Diagnostics::default();
        for (index, (stream, notices)) in decoded.into_iter().enumerate() {
            diagnostics.extend(index as u32, notices);
            streams.push(stream);
        }

        Ok(Self { superblock, free_page_map, directory, streams, diagnostics, store })
    }

    pub fn stream(&self, index: u32) -> Option<&Stream> {
        self.streams.get(index as usize)
    }

    /// Logical bytes of a stream, re-read from its pages.
    pub fn stream_data(&self, index: u32) -> Result<Vec<u8>> {
        let (size, pages) = self
            .directory
            .stream_size(index as usize)
            .zip(self.directory.pages(index as usize))
            .ok_or(PdbError::NoSuchStream(index))?;
        read_stream(&self.store, pages, size)
    }

    pub fn info(&self) -> Option<&InfoStream> {
        self.streams.iter().find_map(|s| match s {
            Stream::Info(info) => Some(info),
            _ => None,
        })
    }

    pub fn types(&self) -> Option<&TypeStream> {
        self.streams.iter().find_map(|s| match s {
            Stream::Types(tpi) => Some(tpi),
            _ => None,
        })
    }

    pub fn page_store(&self) -> &PageStore {
        &self.store
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ── Stream decoding ───────────────────────────────────────────────────────────

type Decoded = (Stream, Vec<Notice>);

/// Reads and dispatches stream `index`. Page-level failures mean the
/// directory itself is corrupt and are returned as errors.
fn decode_one(store: &PageStore, directory: &StreamDirectory, index: usize, max_streams: u32) -> Result<Decoded> {
    let size = directory.stream_infos[index].len();
    let pages = directory.pages(index).unwrap_or_default();
    let data = read_stream(store, pages, size)?;
    debug!(
        stream = index,
        size,
        preview = %hex::encode(&data[..data.len().min(PREVIEW_BYTES)]),
        "decoding stream"
    );
    Ok(dispatch(index as u32, data, store.page_size(), max_streams))
}

fn decode_streams(store: &PageStore, directory: &StreamDirectory, opts: &ParseOptions) -> Result<Vec<Decoded>> {
    let count = directory.stream_infos.len();

    #[cfg(feature = "parallel")]
    if opts.parallel {
        use rayon::prelude::*;
        return (0..count)
            .into_par_iter()
            .map(|i| decode_one(store, directory, i, opts.max_stream_count))
            .collect();
    }

    (0..count)
        .map(|i| decode_one(store, directory, i, opts.max_stream_count))
        .collect()
}
