//! Routing of logical streams to their typed decoders.
//!
//! | Stream | Contents                         | Decoder              |
//! |--------|----------------------------------|----------------------|
//! | 0      | previous stream directory        | [`StreamDirectory`]  |
//! | 1      | info stream (version, identity)  | [`InfoStream`]       |
//! | 2      | type stream                      | [`TypeStream`]       |
//! | 3…     | everything else                  | kept opaque          |
//!
//! New stream kinds are added by extending [`Stream`] and [`StreamId`]
//! together with the match in [`dispatch`].

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::diagnostics::Notice;
use crate::error::PdbError;
use crate::info::InfoStream;
use crate::msf::StreamDirectory;
use crate::tpi::TypeStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamId {
    PreviousDirectory,
    Pdb,
    Tpi,
    Other(u32),
}

impl StreamId {
    pub fn index(self) -> u32 {
        match self {
            StreamId::PreviousDirectory => 0,
            StreamId::Pdb => 1,
            StreamId::Tpi => 2,
            StreamId::Other(i) => i,
        }
    }
}

impl From<u32> for StreamId {
    fn from(index: u32) -> Self {
        match index {
            0 => StreamId::PreviousDirectory,
            1 => StreamId::Pdb,
            2 => StreamId::Tpi,
            i => StreamId::Other(i),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamId::PreviousDirectory => f.write_str("previous stream table"),
            StreamId::Pdb => f.write_str("PDB stream"),
            StreamId::Tpi => f.write_str("TPI stream"),
            StreamId::Other(i) => write!(f, "stream {i}"),
        }
    }
}

/// A decoded stream. The position in [`PdbFile::streams`](crate::PdbFile)
/// is the stream number.
#[derive(Debug, Serialize)]
#[serde(tag = "stream", rename_all = "snake_case")]
pub enum Stream {
    /// Directory snapshot kept for rollback. Empty when stream 0 holds no data.
    PreviousDirectory(StreamDirectory),
    Info(InfoStream),
    Types(TypeStream),
    Opaque {
        index: u32,
        #[serde(serialize_with = "crate::bytes::serialize_hex")]
        bytes: Vec<u8>,
    },
    /// The typed decoder for this stream failed; other streams are unaffected.
    Failed {
        index: u32,
        #[serde(serialize_with = "crate::bytes::serialize_display")]
        error: PdbError,
    },
}

impl Stream {
    pub fn is_failed(&self) -> bool {
        matches!(self, Stream::Failed { .. })
    }
}

/// Decodes one stream's bytes according to its number.
///
/// Never fails: decoder errors become [`Stream::Failed`] and unknown stream
/// numbers become [`Stream::Opaque`], each with a matching notice.
pub fn dispatch(index: u32, data: Vec<u8>, page_size: usize, max_streams: u32) -> (Stream, Vec<Notice>) {
    let id = StreamId::from(index);
    let decoded = match id {
        StreamId::PreviousDirectory if data.is_empty() => {
            Ok((Stream::PreviousDirectory(StreamDirectory::default()), Vec::new()))
        }
        StreamId::PreviousDirectory => StreamDirectory::read(&data, page_size, max_streams)
            .map(|dir| (Stream::PreviousDirectory(dir), Vec::new())),
        StreamId::Pdb => InfoStream::parse(&data).map(|info| (Stream::Info(info), Vec::new())),
        StreamId::Tpi => TypeStream::parse(&data).map(|(tpi, notices)| (Stream::Types(tpi), notices)),
        StreamId::Other(_) => {
            debug!(stream = index, size = data.len(), "no decoder for stream, keeping raw bytes");
            return (Stream::Opaque { index, bytes: data }, vec![Notice::UnrecognizedStream]);
        }
    };

    match decoded {
        Ok(ok) => ok,
        Err(error) => {
            warn!(stream = index, %error, "failed to decode {id}");
            let notice = Notice::StreamFailed { error: error.to_string() };
            (Stream::Failed { index, error }, vec![notice])
        }
    }
}
