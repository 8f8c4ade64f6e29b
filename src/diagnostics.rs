//! Structured, non-fatal findings collected during a decode.
//!
//! Every notice is keyed by the stream it concerns and returned with the
//! decoded file. `tracing` events mirror them, but callers never need a
//! subscriber to observe what was skipped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::tpi::record::TypeRecordKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// No decoder for this stream number; kept as an opaque blob.
    UnrecognizedStream,
    /// The stream's typed decoder failed; the rest of the file is unaffected.
    StreamFailed { error: String },
    /// Record count derived from the index range disagrees with the records
    /// actually present.
    RecordCountMismatch { expected: u32, found: u32 },
    /// Records of this kind were kept as raw bodies.
    UnrecognizedRecordKind { kind: TypeRecordKind, count: u32 },
    /// A record of a known kind had a body its decoder could not parse.
    MalformedRecord { ordinal: u32, kind: TypeRecordKind, reason: String },
    /// Bytes at the end of the record region that do not form a record.
    /// `offset` is relative to the start of the region.
    TrailingBytes { offset: u64, len: u64 },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UnrecognizedStream => write!(f, "decoding skipped, kept as opaque bytes"),
            Notice::StreamFailed { error } => write!(f, "decoding failed: {error}"),
            Notice::RecordCountMismatch { expected, found } => {
                write!(f, "expected {expected} type records, found {found}")
            }
            Notice::UnrecognizedRecordKind { kind, count } => {
                write!(f, "{count} record(s) of unrecognized kind {kind} kept raw")
            }
            Notice::MalformedRecord { ordinal, kind, reason } => {
                write!(f, "record #{ordinal} ({kind}) kept raw: {reason}")
            }
            Notice::TrailingBytes { offset, len } => {
                write!(f, "{len} byte(s) at record offset {offset} do not form a record")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    by_stream: BTreeMap<u32, Vec<Notice>>,
}

impl Diagnostics {
    pub fn push(&mut self, stream: u32, notice: Notice) {
        self.by_stream.entry(stream).or_default().push(notice);
    }

    pub fn extend(&mut self, stream: u32, notices: impl IntoIterator<Item = Notice>) {
        for notice in notices {
            self.push(stream, notice);
        }
    }

    pub fn for_stream(&self, stream: u32) -> &[Notice] {
        self.by_stream.get(&stream).map_or(&[], Vec::as_slice)
    }

    /// All notices in stream order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Notice)> + '_ {
        self.by_stream
            .iter()
            .flat_map(|(&stream, notices)| notices.iter().map(move |n| (stream, n)))
    }

    pub fn len(&self) -> usize {
        self.by_stream.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stream.is_empty()
    }
}
